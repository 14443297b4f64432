use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One fetched comment, immutable after construction. Recipe links are
/// extracted exactly once, when the comment is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub author: String,
    pub author_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub recipe_ids: Vec<String>,
}

impl Comment {
    pub fn new(
        id: u64,
        author: impl Into<String>,
        author_id: Option<u64>,
        created_at: DateTime<Utc>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let recipe_ids = crate::links::extract_recipe_ids(&text);
        Self {
            id,
            author: author.into(),
            author_id,
            created_at,
            text,
            recipe_ids,
        }
    }
}

/// Accumulated entry state for one participant. Entries are never
/// decremented; `recipe_ids` drives the dedupe policy and the exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantTally {
    pub username: String,
    pub user_id: Option<u64>,
    pub comments: Vec<Comment>,
    pub entries: u64,
    pub recipe_ids: BTreeSet<String>,
}

impl ParticipantTally {
    pub(crate) fn new(username: String, user_id: Option<u64>) -> Self {
        Self {
            username,
            user_id,
            comments: Vec::new(),
            entries: 0,
            recipe_ids: BTreeSet::new(),
        }
    }
}

/// Counting policy flags. When both are set, dedupe wins and the
/// per-link flag is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TallyOptions {
    pub dedupe_recipes_per_user: bool,
    pub count_multiple_links_per_comment: bool,
}

/// Read-only ranking row derived from a final tally.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub username: String,
    pub entries: u64,
    pub probability: f64,
}

/// Result of a weighted winner draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawOutcome {
    pub username: String,
    pub entries: u64,
    pub winning_comment_id: u64,
}
