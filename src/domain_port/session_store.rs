use crate::domain_model::*;
use std::time::Duration;

/// Entry holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "session.token";
/// Entry holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "session.refreshToken";
/// Both entries expire together, 30 days after the last write.
pub const SESSION_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 30);
/// Both entries are scoped to the whole site.
pub const SESSION_PATH: &str = "/";

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionStoreError {
    #[error("store error: {0}")]
    Store(String),
}

/// Persistent home of the one token pair a client holds.
///
/// The two entries are written and cleared together, never independently.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn access_token(&self) -> Result<Option<AccessToken>, SessionStoreError>;
    async fn refresh_token(&self) -> Result<Option<RefreshToken>, SessionStoreError>;
    async fn replace(&self, tokens: &TokenPair) -> Result<(), SessionStoreError>;
    async fn clear(&self) -> Result<(), SessionStoreError>;
}
