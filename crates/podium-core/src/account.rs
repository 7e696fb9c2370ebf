//! Account collaborator: session state and guest registration.

use async_trait::async_trait;

/// Session provider for the leaderboard client.
///
/// Registration is assumed idempotent: a `false` result from
/// [`register_guest`](AccountProvider::register_guest) is treated by the
/// pipeline exactly like a transient network failure.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// Whether a player session currently exists.
    fn is_logged_in(&self) -> bool;

    /// Create a guest session. Returns `false` on failure.
    async fn register_guest(&self) -> bool;

    /// Bearer token for the current session, if any.
    fn token(&self) -> Option<String>;
}

/// Fixed-token account for embedders that manage sessions themselves
/// (the CLI reads its token from the credentials file).
pub struct StaticAccount {
    token: String,
}

impl StaticAccount {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccountProvider for StaticAccount {
    fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }

    async fn register_guest(&self) -> bool {
        // No registration backend; an empty token stays logged out.
        false
    }

    fn token(&self) -> Option<String> {
        if self.token.is_empty() {
            None
        } else {
            Some(self.token.clone())
        }
    }
}
