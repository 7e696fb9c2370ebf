//! Read-only score listing records returned by the query endpoints.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One ranked entry from a score listing. Reconstructed per query, never
/// persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub rank: i64,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub is_current_player: bool,
}

/// Result of a score listing query.
///
/// Query failures never unwind past the client: the page comes back empty
/// with a description in `error`.
#[derive(Debug, Default)]
pub struct ScorePage {
    pub scores: Vec<ScoreRecord>,
    pub has_more_scores: bool,
    pub error: Option<String>,
}

impl ScorePage {
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            scores: Vec::new(),
            has_more_scores: false,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Wire shape of a listing response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ScoresResponse {
    #[serde(default)]
    pub scores: Vec<ScoreRecord>,
    /// Presence of a non-empty continuation URL signals more pages.
    #[serde(default)]
    pub next_url: Option<String>,
}
