use crate::domain_model::*;
use crate::domain_port::*;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Session carried by the cookies of one incoming request.
///
/// Reads come from the request's `Cookie` header; writes are kept as
/// `Set-Cookie` values for the response.
#[derive(Debug, Default)]
pub struct CookieSessionStore {
    jar: Mutex<HashMap<String, String>>,
    set_cookies: Mutex<Vec<String>>,
}

impl CookieSessionStore {
    pub fn from_header(header: Option<&str>) -> Self {
        let jar = header
            .map(|h| {
                Cookie::split_parse(h)
                    .filter_map(Result::ok)
                    .map(|c| (c.name().to_string(), c.value_trimmed().to_string()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            jar: Mutex::new(jar),
            set_cookies: Mutex::new(Vec::new()),
        }
    }

    /// `Set-Cookie` values accumulated so far, drained.
    pub fn take_set_cookies(&self) -> Vec<String> {
        std::mem::take(&mut *lock(&self.set_cookies))
    }

    fn get(&self, name: &str) -> Option<String> {
        lock(&self.jar).get(name).filter(|v| !v.is_empty()).cloned()
    }

    fn write(&self, cookie: Cookie<'_>) {
        lock(&self.set_cookies).push(cookie.to_string());
    }

    fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path(SESSION_PATH)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(SESSION_MAX_AGE.as_secs() as i64))
            .build()
    }

    fn removal(name: &'static str) -> Cookie<'static> {
        Cookie::build((name, ""))
            .path(SESSION_PATH)
            .same_site(SameSite::Lax)
            .removal()
            .build()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait::async_trait]
impl SessionStore for CookieSessionStore {
    async fn access_token(&self) -> Result<Option<AccessToken>, SessionStoreError> {
        Ok(self.get(ACCESS_TOKEN_KEY).map(AccessToken))
    }

    async fn refresh_token(&self) -> Result<Option<RefreshToken>, SessionStoreError> {
        Ok(self.get(REFRESH_TOKEN_KEY).map(RefreshToken))
    }

    async fn replace(&self, tokens: &TokenPair) -> Result<(), SessionStoreError> {
        {
            let mut jar = lock(&self.jar);
            jar.insert(ACCESS_TOKEN_KEY.to_string(), tokens.access_token.0.clone());
            jar.insert(REFRESH_TOKEN_KEY.to_string(), tokens.refresh_token.0.clone());
        }
        self.write(Self::session_cookie(
            ACCESS_TOKEN_KEY,
            tokens.access_token.0.clone(),
        ));
        self.write(Self::session_cookie(
            REFRESH_TOKEN_KEY,
            tokens.refresh_token.0.clone(),
        ));
        Ok(())
    }

    async fn clear(&self) -> Result<(), SessionStoreError> {
        {
            let mut jar = lock(&self.jar);
            jar.remove(ACCESS_TOKEN_KEY);
            jar.remove(REFRESH_TOKEN_KEY);
        }
        self.write(Self::removal(ACCESS_TOKEN_KEY));
        self.write(Self::removal(REFRESH_TOKEN_KEY));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_tokens_from_cookie_header() {
        let store = CookieSessionStore::from_header(Some(
            "theme=dark; session.token=abc.def.ghi; session.refreshToken=r-1",
        ));
        assert_eq!(
            store.access_token().await.unwrap(),
            Some(AccessToken("abc.def.ghi".into()))
        );
        assert_eq!(
            store.refresh_token().await.unwrap(),
            Some(RefreshToken("r-1".into()))
        );
        assert!(store.take_set_cookies().is_empty());
    }

    #[tokio::test]
    async fn missing_header_means_no_session() {
        let store = CookieSessionStore::from_header(None);
        assert_eq!(store.access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn quoted_values_are_unquoted() {
        let store = CookieSessionStore::from_header(Some(
            "session.token=\"abc\"; session.refreshToken=\"r-1\"",
        ));
        assert_eq!(
            store.access_token().await.unwrap(),
            Some(AccessToken("abc".into()))
        );
        assert_eq!(
            store.refresh_token().await.unwrap(),
            Some(RefreshToken("r-1".into()))
        );
    }

    #[tokio::test]
    async fn replace_writes_both_cookies_for_thirty_days() {
        let store = CookieSessionStore::from_header(None);
        store.replace(&TokenPair::new("a-2", "r-2")).await.unwrap();

        let written: Vec<Cookie<'static>> = store
            .take_set_cookies()
            .into_iter()
            .map(|c| Cookie::parse(c).unwrap())
            .collect();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].name_value(), ("session.token", "a-2"));
        assert_eq!(written[1].name_value(), ("session.refreshToken", "r-2"));
        for cookie in &written {
            assert_eq!(cookie.max_age(), Some(Duration::days(30)));
            assert_eq!(cookie.path(), Some("/"));
            assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        }
        assert_eq!(
            store.access_token().await.unwrap(),
            Some(AccessToken("a-2".into()))
        );
    }

    #[tokio::test]
    async fn clear_expires_both_cookies() {
        let store =
            CookieSessionStore::from_header(Some("session.token=a; session.refreshToken=r"));
        store.clear().await.unwrap();

        let cookies = store.take_set_cookies();
        assert_eq!(cookies.len(), 2);
        for raw in cookies {
            let cookie = Cookie::parse(raw).unwrap();
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        }
        assert_eq!(store.access_token().await.unwrap(), None);
        assert_eq!(store.refresh_token().await.unwrap(), None);
    }
}
