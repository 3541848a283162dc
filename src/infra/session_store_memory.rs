use crate::domain_model::*;
use crate::domain_port::*;
use tokio::sync::RwLock;

/// Session held in process memory, for an interactive client that lives as
/// long as its session does.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }

    pub async fn snapshot(&self) -> Option<TokenPair> {
        self.tokens.read().await.clone()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn access_token(&self) -> Result<Option<AccessToken>, SessionStoreError> {
        Ok(self
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.access_token.clone()))
    }

    async fn refresh_token(&self) -> Result<Option<RefreshToken>, SessionStoreError> {
        Ok(self
            .tokens
            .read()
            .await
            .as_ref()
            .map(|t| t.refresh_token.clone()))
    }

    async fn replace(&self, tokens: &TokenPair) -> Result<(), SessionStoreError> {
        *self.tokens.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        *self.tokens.write().await = None;
        Ok(())
    }
}
