use crate::application_impl::{DefaultCredential, SignOut};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use serde::Deserialize;
use serde_json::json;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub refresh_path: String,
    /// Upper bound on one refresh call. `None` waits for as long as the
    /// refresh endpoint takes, and every queued call waits with it.
    pub timeout: Option<Duration>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_path: "/refresh".to_string(),
            timeout: None,
        }
    }
}

/// A call parked until the in-flight refresh settles.
type PendingRequest = oneshot::Sender<Result<AccessToken, ApiError>>;

enum RefreshState {
    Idle,
    Refreshing { queue: Vec<PendingRequest> },
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

struct Shared {
    state: Mutex<RefreshState>,
    store: Arc<dyn SessionStore>,
    transport: Arc<dyn HttpTransport>,
    credential: DefaultCredential,
    sign_out: SignOut,
    config: RefreshConfig,
}

/// Single-flight refresh of the client's token pair.
///
/// The first call to observe an expired access token starts the one refresh;
/// every call that observes expiry while it runs joins the queue instead, and
/// all of them receive the same outcome.
#[derive(Clone)]
pub struct TokenRefreshCoordinator {
    shared: Arc<Shared>,
}

impl TokenRefreshCoordinator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        transport: Arc<dyn HttpTransport>,
        credential: DefaultCredential,
        sign_out: SignOut,
        config: RefreshConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(RefreshState::Idle),
                store,
                transport,
                credential,
                sign_out,
                config,
            }),
        }
    }

    /// Resolves with a fresh access token once the pending refresh succeeds.
    ///
    /// `failed_with` is the token the failed call carried. When a refresh has
    /// already completed since then, the current credential is handed back
    /// without refreshing again.
    pub async fn on_auth_expired(
        &self,
        failed_with: Option<&AccessToken>,
    ) -> Result<AccessToken, ApiError> {
        let receiver = {
            let mut state = self.shared.lock_state();

            if let RefreshState::Idle = *state {
                if let Some(current) = self.shared.credential.get() {
                    if failed_with != Some(&current) {
                        debug!("credential already refreshed, skipping refresh");
                        return Ok(current);
                    }
                }
            }

            let (sender, receiver) = oneshot::channel();
            match &mut *state {
                RefreshState::Refreshing { queue } => {
                    queue.push(sender);
                    trace!(queued = queue.len(), "joined in-flight refresh");
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing {
                        queue: vec![sender],
                    };
                    let shared = self.shared.clone();
                    tokio::spawn(async move { shared.run_refresh().await });
                }
            }
            receiver
        };

        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(RefreshError::Aborted.into()),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.shared.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Calls currently parked behind the in-flight refresh.
    pub fn pending(&self) -> usize {
        match &*self.shared.lock_state() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing { queue } => queue.len(),
        }
    }
}

/// Rejects whatever is still queued if the refresh task goes away without
/// settling, whether it panicked or the runtime dropped it.
struct SettleOnDrop {
    shared: Arc<Shared>,
    armed: bool,
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        if self.armed {
            warn!("refresh abandoned before settling");
            for pending in self.shared.take_queue() {
                let _ = pending.send(Err(RefreshError::Aborted.into()));
            }
        }
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Empties the queue and returns to `Idle` in one step.
    fn take_queue(&self) -> Vec<PendingRequest> {
        match mem::replace(&mut *self.lock_state(), RefreshState::Idle) {
            RefreshState::Idle => Vec::new(),
            RefreshState::Refreshing { queue } => queue,
        }
    }

    async fn run_refresh(self: Arc<Self>) {
        let mut guard = SettleOnDrop {
            shared: self.clone(),
            armed: true,
        };

        let outcome = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, self.refresh())
                .await
                .unwrap_or(Err(RefreshError::TimedOut)),
            None => self.refresh().await,
        };

        match outcome {
            Ok(token) => {
                let queue = self.take_queue();
                guard.armed = false;
                info!(resumed = queue.len(), "access token refreshed");
                for pending in queue {
                    let _ = pending.send(Ok(token.clone()));
                }
            }
            Err(e) => {
                warn!("token refresh failed: {}", e);
                let interactive = self.sign_out.context().is_interactive();
                if interactive {
                    if let Err(e) = self.sign_out.run().await {
                        error!("sign-out after failed refresh: {}", e);
                    }
                }
                let queue = self.take_queue();
                guard.armed = false;
                for pending in queue {
                    let failure = if interactive {
                        ApiError::Refresh(e.clone())
                    } else {
                        ApiError::AuthTokenInvalid
                    };
                    let _ = pending.send(Err(failure));
                }
            }
        }
    }

    async fn refresh(&self) -> Result<AccessToken, RefreshError> {
        let refresh_token = self
            .store
            .refresh_token()
            .await?
            .ok_or(RefreshError::MissingRefreshToken)?;

        let request = ApiRequest::post(
            self.config.refresh_path.clone(),
            json!({ "refreshToken": refresh_token.as_str() }),
        );
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(RefreshError::Rejected {
                status: response.status,
                code: response.error_code().map(str::to_owned),
            });
        }

        let body: RefreshResponse = serde_json::from_value(response.body)
            .map_err(|e| RefreshError::Malformed(e.to_string()))?;
        let tokens = TokenPair::new(body.token, body.refresh_token);

        self.store.replace(&tokens).await?;
        self.credential.set(tokens.access_token.clone());
        Ok(tokens.access_token)
    }
}
