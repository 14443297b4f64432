use std::path::{Path, PathBuf};

use giveaway_core::{ConfigError, CoreError};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_SESSION_FILE: &str = ".insta_session.json";

const ENV_LOGIN_USERNAME: &str = "IG_USERNAME";
const ENV_LOGIN_PASSWORD: &str = "IG_PASSWORD";
const ENV_SESSION_FILE: &str = "IG_SESSION_FILE";

/// Optional TOML config file (`giveaway.toml` by default).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub session_file: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Reads the file at `path`. A missing file is only an error when the
    /// path was requested explicitly.
    pub fn load(path: &Path, required: bool) -> Result<Self, CoreError> {
        if !path.exists() {
            if required {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let config = toml::from_str(&raw).map_err(ConfigError::Parse)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }
}

/// Values captured from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub session_file: Option<PathBuf>,
}

impl EnvConfig {
    pub fn capture() -> Self {
        Self {
            login_username: std::env::var(ENV_LOGIN_USERNAME).ok(),
            login_password: std::env::var(ENV_LOGIN_PASSWORD).ok(),
            session_file: std::env::var(ENV_SESSION_FILE).ok().map(PathBuf::from),
        }
    }
}

/// Command-line overrides for the authentication settings.
#[derive(Debug, Clone, Default)]
pub struct AuthOverrides {
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub session_file: Option<PathBuf>,
}

/// Fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub login_username: Option<String>,
    pub login_password: Option<String>,
    pub session_file: PathBuf,
    pub user_agent: Option<String>,
}

impl AppConfig {
    /// Merge precedence: CLI flags > environment > config file > defaults.
    pub fn resolve(file: FileConfig, env: EnvConfig, flags: AuthOverrides) -> Self {
        Self {
            login_username: flags
                .login_username
                .or(env.login_username)
                .or(file.login_username),
            login_password: flags
                .login_password
                .or(env.login_password)
                .or(file.login_password),
            session_file: flags
                .session_file
                .or(env.session_file)
                .or(file.session_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            user_agent: file.user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_config_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("giveaway.toml");
        std::fs::write(
            &path,
            r#"
login_username = "jorbites"
session_file = "/tmp/session.json"
"#,
        )
        .unwrap();

        let config = FileConfig::load(&path, true).unwrap();
        assert_eq!(config.login_username.as_deref(), Some("jorbites"));
        assert_eq!(
            config.session_file,
            Some(PathBuf::from("/tmp/session.json"))
        );
        assert!(config.login_password.is_none());
    }

    #[test]
    fn test_missing_file_is_only_fatal_when_explicit() {
        let path = Path::new("/nonexistent/giveaway.toml");
        assert!(FileConfig::load(path, true).is_err());

        let config = FileConfig::load(path, false).unwrap();
        assert!(config.login_username.is_none());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("giveaway.toml");
        std::fs::write(&path, "post_url = \"oops\"\n").unwrap();

        assert!(FileConfig::load(&path, true).is_err());
    }

    #[test]
    fn test_resolve_precedence() {
        let file = FileConfig {
            login_username: Some("from-file".to_string()),
            login_password: Some("file-pass".to_string()),
            session_file: Some(PathBuf::from("file-session.json")),
            user_agent: None,
        };
        let env = EnvConfig {
            login_username: Some("from-env".to_string()),
            ..Default::default()
        };
        let flags = AuthOverrides {
            session_file: Some(PathBuf::from("flag-session.json")),
            ..Default::default()
        };

        let config = AppConfig::resolve(file, env, flags);
        assert_eq!(config.login_username.as_deref(), Some("from-env"));
        assert_eq!(config.login_password.as_deref(), Some("file-pass"));
        assert_eq!(config.session_file, PathBuf::from("flag-session.json"));
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(
            FileConfig::default(),
            EnvConfig::default(),
            AuthOverrides::default(),
        );
        assert_eq!(config.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
        assert!(config.login_username.is_none());
    }
}
