use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    pub refresh: RefreshConfig,
    /// Where an interactive client lands after signing out.
    pub unauthenticated_destination: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig::default(),
            unauthenticated_destination: "/".to_string(),
        }
    }
}

enum Failure {
    Expired,
    InvalidCredential(Option<String>),
    Other,
}

fn classify(response: &ApiResponse) -> Failure {
    if response.status != 401 {
        return Failure::Other;
    }
    match response.error_code() {
        Some(TOKEN_EXPIRED_CODE) => Failure::Expired,
        code => Failure::InvalidCredential(code.map(str::to_owned)),
    }
}

fn status_error(response: ApiResponse) -> ApiError {
    ApiError::Status {
        status: response.status,
        code: response.error_code().map(str::to_owned),
        body: response.body,
    }
}

/// Every outbound API call goes through here.
///
/// The current access token is attached as a bearer credential. A call
/// rejected because that token expired waits for the shared refresh and is
/// replayed exactly once; any other auth rejection ends the session.
pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn SessionStore>,
    credential: DefaultCredential,
    coordinator: TokenRefreshCoordinator,
    sign_out: SignOut,
}

impl ApiClient {
    pub fn new(
        config: ApiClientConfig,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn SessionStore>,
        signal: Arc<dyn AuthSignal>,
        context: ExecutionContext,
    ) -> Self {
        let credential = DefaultCredential::default();
        let sign_out = SignOut::new(
            store.clone(),
            credential.clone(),
            signal,
            context,
            config.unauthenticated_destination,
        );
        let coordinator = TokenRefreshCoordinator::new(
            store.clone(),
            transport.clone(),
            credential.clone(),
            sign_out.clone(),
            config.refresh,
        );
        Self {
            transport,
            store,
            credential,
            coordinator,
            sign_out,
        }
    }

    pub fn coordinator(&self) -> &TokenRefreshCoordinator {
        &self.coordinator
    }

    pub fn context(&self) -> &ExecutionContext {
        self.sign_out.context()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Makes `token` the credential for calls issued from now on.
    pub fn set_default_credential(&self, token: AccessToken) {
        self.credential.set(token);
    }

    pub async fn sign_out(&self) -> Result<(), ApiError> {
        self.sign_out.run().await?;
        Ok(())
    }

    /// Drops the session locally, without telling other contexts. Used when
    /// the sign-out came from one of them.
    pub async fn forget_session(&self) -> Result<(), ApiError> {
        self.credential.clear();
        self.store.clear().await?;
        Ok(())
    }

    async fn current_token(&self) -> Result<Option<AccessToken>, ApiError> {
        if let Some(token) = self.credential.get() {
            return Ok(Some(token));
        }
        let stored = self.store.access_token().await?;
        if let Some(token) = &stored {
            self.credential.set(token.clone());
        }
        Ok(stored)
    }

    async fn send_with(
        &self,
        request: &ApiRequest,
        token: Option<&AccessToken>,
    ) -> Result<ApiResponse, ApiError> {
        let mut request = request.clone();
        request.bearer = token.map(|t| t.0.clone());
        Ok(self.transport.send(request).await?)
    }

    async fn reject_credential(&self, code: Option<String>) -> ApiError {
        let reason = code.unwrap_or_else(|| "unauthorized".to_string());
        if self.context().is_interactive() {
            if let Err(e) = self.sign_out.run().await {
                error!("sign-out after rejected credential: {}", e);
            }
            ApiError::SignedOut(reason)
        } else {
            debug!(%reason, "credential rejected while rendering");
            ApiError::AuthTokenInvalid
        }
    }

    /// Sends `request` without a credential and without refresh handling.
    pub async fn send_anonymous(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.send_with(&request, None).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(status_error(response))
        }
    }

    pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.current_token().await?;
        let response = self.send_with(&request, token.as_ref()).await?;
        if response.is_success() {
            return Ok(response);
        }

        match classify(&response) {
            Failure::Expired => {
                debug!(path = %request.path, "access token expired");
                let fresh = self.coordinator.on_auth_expired(token.as_ref()).await?;
                let replay = self.send_with(&request, Some(&fresh)).await?;
                if replay.is_success() {
                    return Ok(replay);
                }
                match classify(&replay) {
                    Failure::Expired => Err(ApiError::ExpiredAfterRefresh),
                    Failure::InvalidCredential(code) => Err(self.reject_credential(code).await),
                    Failure::Other => Err(status_error(replay)),
                }
            }
            Failure::InvalidCredential(code) => Err(self.reject_credential(code).await),
            Failure::Other => Err(status_error(response)),
        }
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(ApiRequest::post(path, body)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.get(path).await?;
        serde_json::from_value(response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
    ) -> Result<T, ApiError> {
        let response = self.post(path, body).await?;
        serde_json::from_value(response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
