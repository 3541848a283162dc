use serde::{Deserialize, Serialize};

/// Name of the channel sign-out notifications travel on.
pub const AUTH_CHANNEL_NAME: &str = "auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthMessage {
    #[serde(rename = "signOut")]
    SignOut,
}

impl AuthMessage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMessage::SignOut => "signOut",
        }
    }
}

/// Delivers auth events to every other open context of the same session.
pub trait AuthSignal: Send + Sync {
    fn publish(&self, message: AuthMessage);
}
