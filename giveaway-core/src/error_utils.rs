use crate::error::*;
use std::time::Duration;
use tracing::{error, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::InstagramApi(e) => {
                error!("Instagram API error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::InstagramApi(e) => e.is_retryable(),
            CoreError::Config(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::InstagramApi(e) => e.retry_after(),
            _ if self.is_retryable() => Some(Duration::from_secs(5)), // Default retry delay
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::InstagramApi(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => {
                format!("Invalid input: {}", message)
            }
            CoreError::Io(_) => "File operation failed. Please check paths and permissions.".to_string(),
            CoreError::Serialization(_) => {
                "Failed to read or write structured data.".to_string()
            }
            CoreError::Internal { .. } => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::InstagramApi(_) => "INSTAGRAM_API".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for InstagramApiError {
    fn log_error(&self) -> &Self {
        error!("InstagramApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("InstagramApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            InstagramApiError::RateLimitExceeded { .. } => true,
            InstagramApiError::RequestTimeout => true,
            InstagramApiError::ServerError { status_code } => *status_code >= 500,
            InstagramApiError::InvalidResponse { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            InstagramApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(30)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            InstagramApiError::AuthenticationFailed { .. } => {
                "Instagram login failed. Please check your credentials.".to_string()
            }
            InstagramApiError::LoginRequired => {
                "Instagram requires a login to read comments. Provide credentials or a session file."
                    .to_string()
            }
            InstagramApiError::CheckpointRequired { checkpoint_url } => format!(
                "Instagram flagged this login. Open {} in a browser and approve it, then retry.",
                checkpoint_url
            ),
            InstagramApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            InstagramApiError::Forbidden { resource } => format!(
                "Access denied to {}. You may not have permission to view this content.",
                resource
            ),
            InstagramApiError::PostNotFound { shortcode } => {
                format!("Post '{}' not found or is private.", shortcode)
            }
            InstagramApiError::InvalidPostUrl { url } => format!(
                "'{}' is not an Instagram post URL. Expected /p/SHORTCODE or /reel/SHORTCODE.",
                url
            ),
            InstagramApiError::RequestTimeout => {
                "Request to Instagram timed out. Please try again.".to_string()
            }
            _ => "Instagram API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            InstagramApiError::AuthenticationFailed { .. } => "IG_AUTH_FAILED".to_string(),
            InstagramApiError::LoginRequired => "IG_LOGIN_REQUIRED".to_string(),
            InstagramApiError::CheckpointRequired { .. } => "IG_CHECKPOINT_REQUIRED".to_string(),
            InstagramApiError::RateLimitExceeded { .. } => "IG_RATE_LIMIT".to_string(),
            InstagramApiError::Forbidden { .. } => "IG_FORBIDDEN".to_string(),
            InstagramApiError::PostNotFound { .. } => "IG_POST_NOT_FOUND".to_string(),
            InstagramApiError::InvalidPostUrl { .. } => "IG_INVALID_POST_URL".to_string(),
            InstagramApiError::RequestTimeout => "IG_TIMEOUT".to_string(),
            InstagramApiError::InvalidResponse { .. } => "IG_INVALID_RESPONSE".to_string(),
            InstagramApiError::ServerError { .. } => "IG_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false // Config errors are typically not retryable
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file not found: {}", path)
            }
            ConfigError::MissingField { field } => {
                format!("Required configuration field '{}' is missing.", field)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::MissingField { .. } => "CONFIG_MISSING_FIELD".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let api_error = CoreError::InstagramApi(InstagramApiError::LoginRequired);
        assert_eq!(api_error.error_code(), "INSTAGRAM_API");

        let config_error = CoreError::Config(ConfigError::MissingField {
            field: "login_username".to_string(),
        });
        assert_eq!(config_error.error_code(), "CONFIG");
    }

    #[test]
    fn test_retryable_errors() {
        let retryable =
            CoreError::InstagramApi(InstagramApiError::RateLimitExceeded { retry_after: 60 });
        assert!(retryable.is_retryable());
        assert_eq!(retryable.retry_after(), Some(Duration::from_secs(60)));

        let non_retryable = CoreError::Config(ConfigError::MissingEnvironmentVariable {
            var_name: "IG_USERNAME".to_string(),
        });
        assert!(!non_retryable.is_retryable());
        assert_eq!(non_retryable.retry_after(), None);
    }

    #[test]
    fn test_user_friendly_messages() {
        let checkpoint = InstagramApiError::CheckpointRequired {
            checkpoint_url: "https://www.instagram.com/challenge/".to_string(),
        };
        let message = checkpoint.user_friendly_message();
        assert!(message.contains("https://www.instagram.com/challenge/"));

        let config_error = CoreError::Config(ConfigError::MissingField {
            field: "session_file".to_string(),
        });
        assert!(config_error.user_friendly_message().contains("session_file"));
    }
}
