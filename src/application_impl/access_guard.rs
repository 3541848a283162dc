use crate::application_impl::permission_evaluator;
use crate::application_port::*;
use crate::domain_port::*;
use crate::logger::*;
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct GuardDestinations {
    /// Where a visitor without a session is sent.
    pub unauthenticated: String,
    /// Where a signed-in user lacking a permission or role is sent.
    pub authenticated_home: String,
}

impl Default for GuardDestinations {
    fn default() -> Self {
        Self {
            unauthenticated: "/".to_string(),
            authenticated_home: "/dashboard".to_string(),
        }
    }
}

/// Gate evaluated before a protected server-rendered view.
pub struct AccessGuard {
    decoder: Arc<dyn ClaimDecoder>,
    destinations: GuardDestinations,
}

impl AccessGuard {
    pub fn new(decoder: Arc<dyn ClaimDecoder>, destinations: GuardDestinations) -> Self {
        Self {
            decoder,
            destinations,
        }
    }

    fn to_landing(&self) -> Redirect {
        Redirect::temporary(self.destinations.unauthenticated.clone())
    }

    /// Runs `view` if the session in `store` may see it.
    ///
    /// `AuthTokenInvalid` raised by the view ends the session here, because a
    /// server-rendering client cannot do that itself. Every other view error is
    /// handed back untouched.
    pub async fn run<T, F, Fut>(
        &self,
        store: &dyn SessionStore,
        options: Option<&GuardOptions>,
        view: F,
    ) -> GuardDecision<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let token = match store.access_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no session, redirecting to landing");
                return GuardDecision::RedirectTo(self.to_landing());
            }
            Err(e) => return GuardDecision::Rethrow(e.into()),
        };

        if let Some(options) = options.filter(|o| !o.is_unconstrained()) {
            let claims = match self.decoder.decode(&token) {
                Ok(claims) => claims,
                Err(e) => {
                    warn!("undecodable access token: {}", e);
                    return self.end_session(store).await;
                }
            };
            if permission_evaluator::evaluate(options, &claims) == Access::Deny {
                debug!(?options, "missing permission or role");
                return GuardDecision::RedirectTo(Redirect::temporary(
                    self.destinations.authenticated_home.clone(),
                ));
            }
        }

        match view().await {
            Ok(value) => GuardDecision::Allow(value),
            Err(e) => {
                let invalid = e
                    .downcast_ref::<ApiError>()
                    .is_some_and(ApiError::is_auth_token_invalid);
                if invalid {
                    info!("session rejected while rendering");
                    self.end_session(store).await
                } else {
                    GuardDecision::Rethrow(e)
                }
            }
        }
    }

    async fn end_session<T>(&self, store: &dyn SessionStore) -> GuardDecision<T> {
        match store.clear().await {
            Ok(()) => GuardDecision::RedirectTo(self.to_landing()),
            Err(e) => GuardDecision::Rethrow(e.into()),
        }
    }
}
