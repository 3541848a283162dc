use crate::domain_model::AccessToken;
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory credential attached to new calls. Shared by the pipeline, which
/// reads it, and by refresh and sign-out, which replace or drop it.
#[derive(Debug, Clone, Default)]
pub struct DefaultCredential(Arc<RwLock<Option<AccessToken>>>);

impl DefaultCredential {
    pub fn get(&self) -> Option<AccessToken> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set(&self, token: AccessToken) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
