use crate::domain_model::*;
use crate::domain_port::*;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

/// Session kept in Redis under `{prefix}:session.token` and
/// `{prefix}:session.refreshToken`, one prefix per device.
pub struct RedisSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, entry: &str) -> String {
        format!("{}:{}", self.prefix, entry)
    }

    async fn get(&self, entry: &str) -> Result<Option<String>, SessionStoreError> {
        let key = self.key(entry);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| SessionStoreError::Store(e.to_string()))?;
        Ok(value)
    }
}

#[async_trait::async_trait]
impl SessionStore for RedisSessionStore {
    async fn access_token(&self) -> Result<Option<AccessToken>, SessionStoreError> {
        Ok(self.get(ACCESS_TOKEN_KEY).await?.map(AccessToken))
    }

    async fn refresh_token(&self) -> Result<Option<RefreshToken>, SessionStoreError> {
        Ok(self.get(REFRESH_TOKEN_KEY).await?.map(RefreshToken))
    }

    async fn replace(&self, tokens: &TokenPair) -> Result<(), SessionStoreError> {
        let ttl_secs = SESSION_MAX_AGE.as_secs();
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .set_ex(self.key(ACCESS_TOKEN_KEY), tokens.access_token.as_str(), ttl_secs)
            .ignore()
            .set_ex(self.key(REFRESH_TOKEN_KEY), tokens.refresh_token.as_str(), ttl_secs)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| SessionStoreError::Store(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        let keys = vec![self.key(ACCESS_TOKEN_KEY), self.key(REFRESH_TOKEN_KEY)];
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(keys)
            .await
            .map_err(|e| SessionStoreError::Store(e.to_string()))?;
        Ok(())
    }
}
