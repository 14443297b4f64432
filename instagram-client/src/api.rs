use std::time::Duration;

use chrono::{TimeZone, Utc};
use giveaway_core::{Comment, CoreError, InstagramApiError};
use reqwest::{header, Client, Method, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::auth::Session;

const INSTAGRAM_WEB_BASE: &str = "https://www.instagram.com";

// query_hash of the web app's "comments by shortcode" GraphQL query.
const COMMENTS_QUERY_HASH: &str = "bc3296d1ce80a24b1b6e40b1e72903f5";
const COMMENTS_PAGE_SIZE: u32 = 50;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsQueryResponse {
    pub data: Option<CommentsQueryData>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsQueryData {
    pub shortcode_media: Option<ShortcodeMedia>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcodeMedia {
    pub id: String,
    pub edge_media_to_parent_comment: CommentConnection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentConnection {
    pub count: u64,
    pub page_info: PageInfo,
    pub edges: Vec<CommentEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentEdge {
    pub node: CommentNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: String,
    pub text: String,
    pub created_at: i64,
    pub owner: CommentOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentOwner {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub authenticated: Option<bool>,
    pub user: Option<bool>,
    pub two_factor_required: Option<bool>,
    pub checkpoint_url: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug)]
pub struct InstagramApiClient {
    http_client: Client,
    user_agent: String,
}

impl InstagramApiClient {
    pub fn new(user_agent: String) -> Self {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            user_agent,
        }
    }

    async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        session: &Session,
        query_params: Option<&[(&str, &str)]>,
        form_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", INSTAGRAM_WEB_BASE, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .header(header::USER_AGENT, &self.user_agent)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::REFERER, format!("{}/", INSTAGRAM_WEB_BASE));

        if !session.cookies.is_empty() {
            request_builder = request_builder.header(header::COOKIE, session.cookie_header());
        }
        if let Some(token) = session.csrf_token() {
            request_builder = request_builder.header("X-CSRFToken", token);
        }
        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }
        if let Some(params) = form_params {
            request_builder = request_builder.form(params);
        }

        info!("Making Instagram API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::InstagramApi(InstagramApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        error!("Request failed with status: {} for {}", status, endpoint);
        match status.as_u16() {
            401 => Err(InstagramApiError::LoginRequired.into()),
            403 => Err(InstagramApiError::Forbidden {
                resource: endpoint.to_string(),
            }
            .into()),
            404 => Err(InstagramApiError::InvalidResponse {
                details: "Resource not found".to_string(),
            }
            .into()),
            429 => {
                let retry_after = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!("Rate limited, retry after {} seconds", retry_after);
                Err(InstagramApiError::RateLimitExceeded { retry_after }.into())
            }
            code if status.is_server_error() => {
                Err(InstagramApiError::ServerError { status_code: code }.into())
            }
            _ => Err(InstagramApiError::InvalidResponse {
                details: format!("Unexpected status {}", status),
            }
            .into()),
        }
    }

    /// Performs the Instagram web login flow: prime a CSRF token, then post
    /// the browser-style password envelope. Returns the authenticated
    /// session on success.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, CoreError> {
        let mut session = Session {
            username: Some(username.to_string()),
            cookies: Vec::new(),
        };

        let response = self
            .make_request(Method::GET, "/accounts/login/", &session, None, None)
            .await?;
        absorb_response_cookies(&mut session, &response);

        if session.csrf_token().is_none() {
            return Err(InstagramApiError::AuthenticationFailed {
                reason: "No CSRF token issued".to_string(),
            }
            .into());
        }

        let enc_password = format!(
            "#PWD_INSTAGRAM_BROWSER:0:{}:{}",
            Utc::now().timestamp(),
            password
        );
        let form = [
            ("username", username),
            ("enc_password", enc_password.as_str()),
        ];
        let response = self
            .make_request(
                Method::POST,
                "/accounts/login/ajax/",
                &session,
                None,
                Some(&form[..]),
            )
            .await?;
        absorb_response_cookies(&mut session, &response);

        let login: LoginResponse = response.json().await.map_err(|e| {
            error!("Failed to parse login response: {}", e);
            CoreError::InstagramApi(InstagramApiError::InvalidResponse {
                details: "Failed to parse login response".to_string(),
            })
        })?;

        if let Some(checkpoint_url) = login.checkpoint_url {
            return Err(InstagramApiError::CheckpointRequired {
                checkpoint_url: format!("{}{}", INSTAGRAM_WEB_BASE, checkpoint_url),
            }
            .into());
        }
        if login.two_factor_required.unwrap_or(false) {
            return Err(InstagramApiError::AuthenticationFailed {
                reason: "Two-factor login is not supported; reuse a session file instead"
                    .to_string(),
            }
            .into());
        }
        if !login.authenticated.unwrap_or(false) {
            let reason = if login.user.unwrap_or(false) {
                "Wrong password".to_string()
            } else {
                login
                    .message
                    .unwrap_or_else(|| "Unknown username".to_string())
            };
            return Err(InstagramApiError::AuthenticationFailed { reason }.into());
        }
        if !session.is_logged_in() {
            return Err(InstagramApiError::AuthenticationFailed {
                reason: "Login succeeded but no session cookie was issued".to_string(),
            }
            .into());
        }

        info!("Logged in as {}", username);
        Ok(session)
    }

    /// Pages through the full comment connection of one post and realizes
    /// every comment in memory, in the order the platform returns them.
    pub async fn fetch_all_comments(
        &self,
        session: &Session,
        shortcode: &str,
    ) -> Result<Vec<Comment>, CoreError> {
        let mut comments = Vec::new();
        let mut cursor: Option<String> = None;
        let mut announced_total: Option<u64> = None;

        loop {
            let page = self
                .fetch_comment_page(session, shortcode, cursor.as_deref())
                .await?;

            let media = page
                .data
                .and_then(|d| d.shortcode_media)
                .ok_or_else(|| InstagramApiError::PostNotFound {
                    shortcode: shortcode.to_string(),
                })?;
            let connection = media.edge_media_to_parent_comment;

            if announced_total.is_none() {
                announced_total = Some(connection.count);
                debug!(
                    "Post {} reports {} top-level comments",
                    shortcode, connection.count
                );
            }

            comments.extend(
                connection
                    .edges
                    .into_iter()
                    .filter_map(|edge| comment_from_node(edge.node)),
            );

            if !connection.page_info.has_next_page {
                break;
            }
            match connection.page_info.end_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => {
                    warn!("Comment page for {} claims a next page without a cursor", shortcode);
                    break;
                }
            }
        }

        info!("Fetched {} comments for post {}", comments.len(), shortcode);
        Ok(comments)
    }

    async fn fetch_comment_page(
        &self,
        session: &Session,
        shortcode: &str,
        cursor: Option<&str>,
    ) -> Result<CommentsQueryResponse, CoreError> {
        let variables = serde_json::json!({
            "shortcode": shortcode,
            "first": COMMENTS_PAGE_SIZE,
            "after": cursor,
        })
        .to_string();
        let params = [
            ("query_hash", COMMENTS_QUERY_HASH),
            ("variables", variables.as_str()),
        ];

        let response = self
            .make_request(Method::GET, "/graphql/query/", session, Some(&params[..]), None)
            .await?;

        response.json().await.map_err(|e| {
            error!("Failed to parse comment page: {}", e);
            CoreError::InstagramApi(InstagramApiError::InvalidResponse {
                details: format!("Failed to parse comments for post {}", shortcode),
            })
        })
    }
}

fn absorb_response_cookies(session: &mut Session, response: &Response) {
    let headers = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok());
    session.absorb_set_cookies(headers);
}

/// Converts one GraphQL comment node into a core comment. Nodes with a
/// non-numeric id are skipped with a warning rather than failing the fetch.
fn comment_from_node(node: CommentNode) -> Option<Comment> {
    let id = match node.id.parse::<u64>() {
        Ok(id) => id,
        Err(_) => {
            warn!("Skipping comment with non-numeric id {:?}", node.id);
            return None;
        }
    };
    let author_id = node.owner.id.parse::<u64>().ok();
    let created_at = Utc
        .timestamp_opt(node.created_at, 0)
        .single()
        .unwrap_or_else(Utc::now);

    Some(Comment::new(
        id,
        node.owner.username,
        author_id,
        created_at,
        node.text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"{
        "data": {
            "shortcode_media": {
                "id": "3112223334445556667",
                "edge_media_to_parent_comment": {
                    "count": 2,
                    "page_info": {"has_next_page": false, "end_cursor": null},
                    "edges": [
                        {"node": {
                            "id": "17900001",
                            "text": "mi voto: https://jorbites.com/recipes/42",
                            "created_at": 1690000000,
                            "owner": {"id": "501", "username": "alice"}
                        }},
                        {"node": {
                            "id": "17900002",
                            "text": "suerte!",
                            "created_at": 1690000100,
                            "owner": {"id": "502", "username": "bob"}
                        }}
                    ]
                }
            }
        },
        "status": "ok"
    }"#;

    #[test]
    fn test_api_client_creation() {
        let client = InstagramApiClient::new(DEFAULT_USER_AGENT.to_string());
        assert_eq!(client.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_comment_page_deserialization() {
        let page: CommentsQueryResponse = serde_json::from_str(SAMPLE_PAGE).unwrap();
        let media = page.data.unwrap().shortcode_media.unwrap();
        let connection = media.edge_media_to_parent_comment;

        assert_eq!(connection.count, 2);
        assert!(!connection.page_info.has_next_page);
        assert_eq!(connection.edges.len(), 2);
        assert_eq!(connection.edges[0].node.owner.username, "alice");
    }

    #[test]
    fn test_comment_node_conversion() {
        let node = CommentNode {
            id: "17900001".to_string(),
            text: "entry https://jorbites.com/recipes/42".to_string(),
            created_at: 1_690_000_000,
            owner: CommentOwner {
                id: "501".to_string(),
                username: "alice".to_string(),
            },
        };

        let comment = comment_from_node(node).expect("numeric id converts");
        assert_eq!(comment.id, 17_900_001);
        assert_eq!(comment.author, "alice");
        assert_eq!(comment.author_id, Some(501));
        assert_eq!(comment.recipe_ids, vec!["42".to_string()]);
        assert_eq!(comment.created_at.timestamp(), 1_690_000_000);
    }

    #[test]
    fn test_non_numeric_comment_id_is_skipped() {
        let node = CommentNode {
            id: "not-a-number".to_string(),
            text: "hello".to_string(),
            created_at: 1_690_000_000,
            owner: CommentOwner {
                id: "501".to_string(),
                username: "alice".to_string(),
            },
        };
        assert!(comment_from_node(node).is_none());
    }

    #[test]
    fn test_login_response_variants() {
        let ok: LoginResponse =
            serde_json::from_str(r#"{"authenticated": true, "user": true, "status": "ok"}"#)
                .unwrap();
        assert_eq!(ok.authenticated, Some(true));

        let checkpoint: LoginResponse = serde_json::from_str(
            r#"{"message": "checkpoint_required", "checkpoint_url": "/challenge/123/", "status": "fail"}"#,
        )
        .unwrap();
        assert_eq!(checkpoint.checkpoint_url.as_deref(), Some("/challenge/123/"));
        assert_eq!(checkpoint.authenticated, None);
    }
}
