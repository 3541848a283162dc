use crate::domain_port::{SessionStoreError, TransportError};
use serde_json::Value;

/// Code the API puts on a 401 when only the access token has lapsed.
pub const TOKEN_EXPIRED_CODE: &str = "token.expired";

/// Why a refresh attempt did not produce a new token pair.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefreshError {
    #[error("no refresh token stored")]
    MissingRefreshToken,
    #[error("refresh token rejected ({status})")]
    Rejected { status: u16, code: Option<String> },
    #[error("refresh transport failed: {0}")]
    Transport(#[from] TransportError),
    #[error("refresh response malformed: {0}")]
    Malformed(String),
    #[error("refresh timed out")]
    TimedOut,
    #[error("refresh aborted before completing")]
    Aborted,
    #[error("refreshed session could not be stored: {0}")]
    Store(#[from] SessionStoreError),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Unrecoverable credential failure in an interactive context. The session
    /// has already been cleared and a sign-out broadcast.
    #[error("signed out: {0}")]
    SignedOut(String),
    /// Unrecoverable credential failure while rendering on the server. The
    /// enclosing guard clears the session and redirects.
    #[error("auth token invalid")]
    AuthTokenInvalid,
    #[error(transparent)]
    Refresh(#[from] RefreshError),
    /// The replay after a successful refresh expired again.
    #[error("access token expired again after refresh")]
    ExpiredAfterRefresh,
    #[error("request failed with status {status}")]
    Status {
        status: u16,
        code: Option<String>,
        body: Value,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_auth_token_invalid(&self) -> bool {
        matches!(self, ApiError::AuthTokenInvalid)
    }
}
