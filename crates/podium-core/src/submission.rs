//! Score submission records and their anti-tamper checksum.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// One score post, as sent to the service and as journaled to the retry
/// queue log (one JSON object per line).
///
/// Immutable once built: a submission is either delivered or persisted,
/// never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub leaderboard_id: String,
    pub score: f64,
    pub nickname: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Unix seconds.
    pub timestamp: f64,
    pub checksum: String,
}

impl ScoreSubmission {
    pub fn new(
        leaderboard_id: impl Into<String>,
        score: f64,
        nickname: impl Into<String>,
        metadata: Map<String, Value>,
        timestamp: f64,
    ) -> Self {
        Self {
            leaderboard_id: leaderboard_id.into(),
            score,
            nickname: nickname.into(),
            metadata,
            timestamp,
            checksum: compute_checksum(score, timestamp),
        }
    }

    /// JSON body for the score post endpoint. The leaderboard id rides in
    /// the URL, not the body.
    pub fn to_body(&self) -> Value {
        serde_json::json!({
            "score": self.score,
            "nickname": self.nickname,
            "timestamp": self.timestamp,
            "metadata": self.metadata,
            "checksum": self.checksum,
        })
    }
}

/// Tag sent with each submission: SHA-256 over the decimal sum of the
/// truncated score and timestamp.
///
/// Guessable by construction; the service only uses it to reject casually
/// mangled payloads, so it is kept for wire compatibility rather than as an
/// integrity check.
pub fn compute_checksum(score: f64, timestamp: f64) -> String {
    let sum = score.trunc() as i64 + timestamp.trunc() as i64;
    let digest = Sha256::digest(sum.to_string().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_ignores_fractional_parts() {
        assert_eq!(
            compute_checksum(120.9, 1_700_000_000.7),
            compute_checksum(120.1, 1_700_000_000.0)
        );
    }

    #[test]
    fn test_checksum_varies_with_inputs() {
        assert_ne!(
            compute_checksum(120.0, 1_700_000_000.0),
            compute_checksum(121.0, 1_700_000_000.0)
        );
    }

    #[test]
    fn test_submission_carries_checksum() {
        let sub = ScoreSubmission::new("weekly", 42.0, "dax", Map::new(), 1_700_000_000.0);
        assert_eq!(sub.checksum, compute_checksum(42.0, 1_700_000_000.0));
        assert_eq!(sub.checksum.len(), 64);
    }
}
