use crate::application_impl::DefaultCredential;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::Arc;

/// Ends the session of one client: both stored entries go, other contexts
/// are told, and an interactive client leaves for the landing view.
#[derive(Clone)]
pub struct SignOut {
    store: Arc<dyn SessionStore>,
    credential: DefaultCredential,
    signal: Arc<dyn AuthSignal>,
    context: ExecutionContext,
    landing: String,
}

impl SignOut {
    pub fn new(
        store: Arc<dyn SessionStore>,
        credential: DefaultCredential,
        signal: Arc<dyn AuthSignal>,
        context: ExecutionContext,
        landing: impl Into<String>,
    ) -> Self {
        Self {
            store,
            credential,
            signal,
            context,
            landing: landing.into(),
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub async fn run(&self) -> Result<(), SessionStoreError> {
        self.credential.clear();
        let cleared = self.store.clear().await;
        self.signal.publish(AuthMessage::SignOut);
        if let ExecutionContext::Interactive { navigator } = &self.context {
            navigator.navigate(&self.landing);
        }
        info!(context = ?self.context, "signed out");
        cleared
    }
}
