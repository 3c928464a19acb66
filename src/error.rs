//! Client error types.
//!
//! Token decoding and expiry problems never appear here: the session
//! manager absorbs them and reports "no token" instead. Everything below
//! propagates to the caller, which decides how to show it.

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The backend answered 401. The session has already been cleared.
    #[error("Unauthorized - please login again")]
    Unauthorized,

    /// Non-401 failure status; carries the server's message or the
    /// status reason phrase.
    #[error("{0}")]
    RequestFailed(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Authentication required but no valid token found")]
    AuthRequired,

    #[error("HTTP request failed: {0}")]
    Transport(String),

    /// The view that issued the request navigated away before it resolved.
    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// True for failures that mean the user has to log in again.
    pub fn needs_login(&self) -> bool {
        matches!(self, ClientError::Unauthorized | ClientError::AuthRequired)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Transport(e.to_string())
    }
}
