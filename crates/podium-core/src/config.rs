//! Client configuration and tuning constants.

use std::path::{Path, PathBuf};

use tracing::warn;

pub mod queue {
    /// Maximum number of failed submissions kept for retry.
    ///
    /// When a new failure would push the queue past this bound, the entry
    /// with the worst score is evicted.
    pub const MAX_FAILED_QUEUE_SIZE: usize = 20;
}

pub mod retry {
    use std::time::Duration;

    /// Delay before the first timed retry; also the reset value after a
    /// successful retry.
    pub const INITIAL_BACKOFF: Duration = Duration::from_secs(2);

    /// Upper bound on the doubling backoff.
    pub const MAX_BACKOFF: Duration = Duration::from_secs(60);
}

pub mod limits {
    /// Longest accepted nickname, in characters.
    pub const MAX_NICKNAME_LEN: usize = 15;

    /// Largest page size for score listings.
    pub const MAX_PAGE_LIMIT: i64 = 50;

    /// Largest window for nearby-score queries.
    pub const MAX_NEARBY_COUNT: i64 = 25;
}

/// Static configuration for a [`LeaderboardClient`](crate::LeaderboardClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Service base URL, without a trailing slash.
    pub base_url: String,
    /// Service-level auth token, used as the fallback bearer for listing
    /// queries when no player session exists.
    pub service_token: String,
    /// Location of the on-disk retry queue log.
    pub queue_path: PathBuf,
}

impl ClientConfig {
    pub fn new<P: AsRef<Path>>(
        base_url: impl Into<String>,
        service_token: impl Into<String>,
        queue_path: P,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let service_token = service_token.into();

        if service_token.is_empty() {
            warn!("No service auth token configured; requests may be rejected");
        }

        Self {
            base_url,
            service_token,
            queue_path: queue_path.as_ref().to_path_buf(),
        }
    }
}
