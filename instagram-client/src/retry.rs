use std::time::Duration;

use giveaway_core::{CoreError, InstagramApiError};
use tokio::time::sleep;
use tracing::{debug, info};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Retry config tuned for the Instagram web API
    pub fn instagram() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.2, // jitter to avoid hammering in lockstep
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after a server-provided delay
    RetryWithDelay(Duration),
    /// Don't retry (for permanent failures)
    NoRetry,
}

/// Determine retry strategy based on error type
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    match error {
        CoreError::InstagramApi(api_error) => match api_error {
            InstagramApiError::RateLimitExceeded { retry_after } => {
                RetryStrategy::RetryWithDelay(Duration::from_secs(*retry_after))
            }
            InstagramApiError::ServerError { .. } => RetryStrategy::Retry,
            InstagramApiError::RequestTimeout => RetryStrategy::Retry,
            InstagramApiError::InvalidResponse { .. } => RetryStrategy::Retry,
            // Authentication and addressing problems are permanent
            InstagramApiError::AuthenticationFailed { .. } => RetryStrategy::NoRetry,
            InstagramApiError::LoginRequired => RetryStrategy::NoRetry,
            InstagramApiError::CheckpointRequired { .. } => RetryStrategy::NoRetry,
            InstagramApiError::Forbidden { .. } => RetryStrategy::NoRetry,
            InstagramApiError::PostNotFound { .. } => RetryStrategy::NoRetry,
            InstagramApiError::InvalidPostUrl { .. } => RetryStrategy::NoRetry,
        },
        CoreError::Network(reqwest_error) => {
            if reqwest_error.is_timeout() || reqwest_error.is_connect() {
                RetryStrategy::Retry
            } else {
                RetryStrategy::NoRetry
            }
        }
        _ => RetryStrategy::NoRetry,
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential_delay = if attempt == 0 {
        Duration::from_millis(config.base_delay_ms)
    } else {
        let multiplier = config.backoff_multiplier.powi(attempt as i32);
        let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(config.max_delay_ms))
    };

    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);
    let final_delay = exponential_delay + Duration::from_millis(jitter);

    final_delay.min(Duration::from_millis(config.max_delay_ms))
}

/// Wraps fallible async operations with bounded retries
#[derive(Debug)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Execute an operation, retrying transient failures until the attempt
    /// budget runs out. The final error is returned unwrapped.
    pub async fn execute<F, Fut, T>(
        &self,
        operation_name: &str,
        operation: F,
    ) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, operation_name);
            }

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            "Operation {} succeeded after {} retries",
                            operation_name, attempt
                        );
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            let last_attempt = attempt + 1 >= self.config.max_attempts;
            match get_retry_strategy(&error) {
                RetryStrategy::Retry if !last_attempt => {
                    let delay = calculate_delay(attempt, &self.config);
                    info!("Retrying {} in {:?} due to: {}", operation_name, delay, error);
                    sleep(delay).await;
                }
                RetryStrategy::RetryWithDelay(delay) if !last_attempt => {
                    info!(
                        "Retrying {} after specified delay of {:?} due to: {}",
                        operation_name, delay, error
                    );
                    sleep(delay).await;
                }
                _ => {
                    debug!("Not retrying {}: {}", operation_name, error);
                    return Err(error);
                }
            }
        }

        Err(CoreError::Internal {
            message: format!("{} was never attempted (max_attempts = 0)", operation_name),
        })
    }
}
