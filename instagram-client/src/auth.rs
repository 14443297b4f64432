use std::path::{Path, PathBuf};

use giveaway_core::CoreError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One persisted cookie of the Instagram web session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// A logged-in (or anonymous) Instagram web session: the username it was
/// created for plus the cookies the platform handed out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub username: Option<String>,
    pub cookies: Vec<SessionCookie>,
}

impl Session {
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.cookie("csrftoken")
    }

    /// A session counts as logged in once Instagram has issued a sessionid.
    pub fn is_logged_in(&self) -> bool {
        self.cookie("sessionid").is_some_and(|v| !v.is_empty())
    }

    /// Renders the `Cookie` request header for this session.
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Merges `Set-Cookie` response headers into the session, replacing
    /// cookies that were re-issued.
    pub fn absorb_set_cookies<'a>(&mut self, headers: impl Iterator<Item = &'a str>) {
        for header in headers {
            let Some((name, value)) = parse_set_cookie(header) else {
                continue;
            };
            match self.cookies.iter_mut().find(|c| c.name == name) {
                Some(existing) => existing.value = value,
                None => self.cookies.push(SessionCookie { name, value }),
            }
        }
    }
}

/// Pulls the `name=value` pair out of one `Set-Cookie` header, dropping
/// attributes like Path and Expires. Deletion markers (empty values) are
/// kept so they overwrite stale cookies.
fn parse_set_cookie(header: &str) -> Option<(String, String)> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    Some((name.to_string(), value.to_string()))
}

/// Loads and saves sessions as JSON at a fixed path, mirroring the
/// session-file workflow of the Instagram tooling this replaces.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `Ok(None)` when no session file exists yet. A file that
    /// exists but cannot be parsed is reported as a warning and treated as
    /// absent, so a corrupt session falls back to a fresh login.
    pub fn load(&self) -> Result<Option<Session>, CoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No session file");
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                info!(path = %self.path.display(), "Loaded session file");
                Ok(Some(session))
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Session file is unreadable, ignoring it"
                );
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &Session) -> Result<(), CoreError> {
        let raw = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, raw)?;
        info!(path = %self.path.display(), "Saved session file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_cookie() {
        assert_eq!(
            parse_set_cookie("csrftoken=abc123; Path=/; Secure"),
            Some(("csrftoken".to_string(), "abc123".to_string()))
        );
        assert_eq!(
            parse_set_cookie("sessionid=\"\"; Max-Age=0"),
            Some(("sessionid".to_string(), String::new()))
        );
        assert_eq!(parse_set_cookie("nonsense"), None);
    }

    #[test]
    fn test_absorb_replaces_existing_cookies() {
        let mut session = Session::default();
        session.absorb_set_cookies(["csrftoken=old; Path=/"].into_iter());
        session.absorb_set_cookies(["csrftoken=new; Path=/", "mid=xyz"].into_iter());

        assert_eq!(session.cookie("csrftoken"), Some("new"));
        assert_eq!(session.cookie("mid"), Some("xyz"));
        assert_eq!(session.cookies.len(), 2);
    }

    #[test]
    fn test_cookie_header_and_login_state() {
        let mut session = Session {
            username: Some("tester".to_string()),
            cookies: vec![SessionCookie {
                name: "csrftoken".to_string(),
                value: "tok".to_string(),
            }],
        };
        assert!(!session.is_logged_in());

        session.absorb_set_cookies(["sessionid=12345%3Aabcdef"].into_iter());
        assert!(session.is_logged_in());
        assert_eq!(session.cookie_header(), "csrftoken=tok; sessionid=12345%3Aabcdef");
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));

        assert!(store.load().unwrap().is_none());

        let session = Session {
            username: Some("tester".to_string()),
            cookies: vec![SessionCookie {
                name: "sessionid".to_string(),
                value: "s3cr3t".to_string(),
            }],
        };
        store.save(&session).unwrap();

        let loaded = store.load().unwrap().expect("session saved");
        assert_eq!(loaded.username.as_deref(), Some("tester"));
        assert!(loaded.is_logged_in());
    }

    #[test]
    fn test_corrupt_session_file_is_treated_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = SessionStore::new(&path);
        assert!(store.load().unwrap().is_none());
    }
}
