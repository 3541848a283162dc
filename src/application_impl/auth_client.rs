use crate::application_impl::ApiClient;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct SessionResponse {
    token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    roles: Vec<String>,
}

/// Session operations of an interactive client: signing in, loading the
/// signed-in identity and signing out.
pub struct AuthClient {
    api: Arc<ApiClient>,
    authenticated_home: String,
}

impl AuthClient {
    pub fn new(api: Arc<ApiClient>, authenticated_home: impl Into<String>) -> Self {
        Self {
            api,
            authenticated_home: authenticated_home.into(),
        }
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub async fn sign_in(&self, credentials: SignInCredentials) -> Result<User, ApiError> {
        let request = ApiRequest::post(
            "/sessions",
            serde_json::json!({
                "email": credentials.email,
                "password": credentials.password,
            }),
        );
        let response = self.api.send_anonymous(request).await?;
        let body: SessionResponse =
            serde_json::from_value(response.body).map_err(|e| ApiError::Decode(e.to_string()))?;

        let tokens = TokenPair::new(body.token, body.refresh_token);
        self.api.store().replace(&tokens).await?;
        self.api.set_default_credential(tokens.access_token);

        if let ExecutionContext::Interactive { navigator } = self.api.context() {
            navigator.navigate(&self.authenticated_home);
        }
        info!(email = %credentials.email, "signed in");

        Ok(User {
            email: credentials.email,
            permissions: body.permissions,
            roles: body.roles,
        })
    }

    /// Fetches the signed-in identity. An interactive client ends a session
    /// the API will not accept on the spot; while rendering, the error is left
    /// to the enclosing guard.
    pub async fn current_user(&self) -> Result<Option<User>, ApiError> {
        if self.api.store().access_token().await?.is_none() {
            return Ok(None);
        }
        match self.api.get_json::<User>("/me").await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("loading current user failed: {}", e);
                let already_ended = matches!(e, ApiError::SignedOut(_) | ApiError::Refresh(_));
                if self.api.context().is_interactive() && !already_ended {
                    self.api.sign_out().await?;
                }
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self) -> Result<(), ApiError> {
        self.api.sign_out().await
    }
}
