use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Another request is already in flight")]
    Busy,

    #[error("Guest registration failed")]
    AuthFailure,

    #[error("Server error (status {status})")]
    TransientServer { status: u16 },

    #[error("Request rejected by server (status {status})")]
    PermanentReject { status: u16 },

    #[error("Malformed response: {0}")]
    ParseError(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if a failed submission may succeed on a later attempt.
    ///
    /// Transport failures, 5xx responses and failed guest registration are
    /// retryable; validation failures and 4xx rejections are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::TransientServer { .. } | Error::AuthFailure
        )
    }
}
