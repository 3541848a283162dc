use crate::application_impl::ApiClient;
use crate::domain_port::AuthMessage;
use crate::infra::AuthSubscription;
use crate::logger::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Ends this context's session when another context signs out.
pub struct SignOutListener {
    subscription: AuthSubscription,
    api: Arc<ApiClient>,
    cancellation_token: CancellationToken,
}

impl SignOutListener {
    pub fn new(
        subscription: AuthSubscription,
        api: Arc<ApiClient>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            subscription,
            api,
            cancellation_token,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    debug!("sign-out listener shutting down...");
                    break;
                }
                message = self.subscription.recv() => match message {
                    Some(AuthMessage::SignOut) => {
                        info!("signed out in another context");
                        if let Err(e) = self.api.forget_session().await {
                            error!("clearing session after remote sign-out: {}", e);
                        }
                    }
                    None => break,
                }
            }
        }
    }
}
