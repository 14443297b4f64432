pub mod api;
pub mod auth;
pub mod post;
pub mod retry;

pub use api::{InstagramApiClient, DEFAULT_USER_AGENT};
pub use auth::{Session, SessionCookie, SessionStore};
pub use post::shortcode_from_url;
pub use retry::{RetryConfig, RetryExecutor};

use std::path::PathBuf;

use giveaway_core::{Comment, CoreError};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub session_file: PathBuf,
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(session_file: impl Into<PathBuf>) -> Self {
        Self {
            session_file: session_file.into(),
            login_username: None,
            login_password: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// High-level comment source for one giveaway post. Owns the API client,
/// the session store and the retry policy.
pub struct InstagramClient {
    api: InstagramApiClient,
    store: SessionStore,
    retry: RetryExecutor,
    login_username: Option<String>,
    login_password: Option<String>,
}

impl InstagramClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            api: InstagramApiClient::new(config.user_agent),
            store: SessionStore::new(config.session_file),
            retry: RetryExecutor::new(RetryConfig::instagram()),
            login_username: config.login_username,
            login_password: config.login_password,
        }
    }

    /// Session precedence: a usable session file wins; otherwise log in with
    /// the configured credentials and persist the fresh session; otherwise
    /// proceed unauthenticated (the platform will likely reject the fetch).
    pub async fn resolve_session(&self) -> Result<Session, CoreError> {
        if let Some(session) = self.store.load()? {
            if session.is_logged_in() {
                info!(
                    username = session.username.as_deref().unwrap_or("<unknown>"),
                    "Reusing saved session"
                );
                return Ok(session);
            }
            warn!("Session file has no login cookie, ignoring it");
        }

        if let (Some(username), Some(password)) = (&self.login_username, &self.login_password) {
            let session = self.api.login(username, password).await?;
            if let Err(e) = self.store.save(&session) {
                warn!("Could not save session file: {}", e);
            }
            return Ok(session);
        }

        info!("No session file and no credentials, proceeding unauthenticated");
        Ok(Session::default())
    }

    /// Resolves the post address and fetches the full comment list,
    /// retrying transient API failures.
    pub async fn fetch_giveaway_comments(
        &self,
        post_url: &str,
    ) -> Result<(String, Vec<Comment>), CoreError> {
        let shortcode = shortcode_from_url(post_url)?;
        let session = self.resolve_session().await?;

        let comments = self
            .retry
            .execute("fetch_comments", || {
                self.api.fetch_all_comments(&session, &shortcode)
            })
            .await?;

        Ok((shortcode, comments))
    }
}
