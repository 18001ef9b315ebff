use thiserror::Error;

/// Failures raised by collaborators (HTTP backend, hint storage).
///
/// The session store and space directory never let these escape: they are
/// converted into state flags at the store boundary. Only explicit,
/// user-initiated switcher actions hand them back to the caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Not available in guest mode")]
    GuestMode,

    #[error("No active space")]
    NoActiveSpace,
}

impl ClientError {
    /// Maps a transport error, keeping timeouts distinguishable.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Http(err)
        }
    }
}
