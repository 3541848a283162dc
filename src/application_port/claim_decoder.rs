use crate::domain_model::*;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClaimError {
    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Reads claims out of an access token without verifying it.
pub trait ClaimDecoder: Send + Sync {
    fn decode(&self, token: &AccessToken) -> Result<ClaimSet, ClaimError>;
}
