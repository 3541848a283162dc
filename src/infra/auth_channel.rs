use crate::domain_port::*;
use crate::logger::*;
use nanoid::nanoid;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct AuthEnvelope {
    pub origin: String,
    pub message: AuthMessage,
}

/// Process-wide `auth` channel shared by every open context of a session.
#[derive(Debug, Clone)]
pub struct AuthChannel {
    sender: broadcast::Sender<AuthEnvelope>,
}

impl Default for AuthChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn name(&self) -> &'static str {
        AUTH_CHANNEL_NAME
    }

    /// Joins the channel as a new context. Like a browser broadcast channel,
    /// a context does not hear its own messages.
    pub fn open(&self) -> AuthChannelHandle {
        AuthChannelHandle {
            origin: nanoid!(10),
            sender: self.sender.clone(),
        }
    }

    /// Every message, whichever context sent it.
    pub fn observe(&self) -> broadcast::Receiver<AuthEnvelope> {
        self.sender.subscribe()
    }
}

#[derive(Debug, Clone)]
pub struct AuthChannelHandle {
    origin: String,
    sender: broadcast::Sender<AuthEnvelope>,
}

impl AuthChannelHandle {
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            origin: self.origin.clone(),
            receiver: self.sender.subscribe(),
        }
    }
}

impl AuthSignal for AuthChannelHandle {
    fn publish(&self, message: AuthMessage) {
        let envelope = AuthEnvelope {
            origin: self.origin.clone(),
            message,
        };
        // nobody listening is fine
        if self.sender.send(envelope).is_err() {
            trace!(channel = AUTH_CHANNEL_NAME, "no listeners for {}", message.as_str());
        }
    }
}

pub struct AuthSubscription {
    origin: String,
    receiver: broadcast::Receiver<AuthEnvelope>,
}

impl AuthSubscription {
    /// Next message from another context; `None` once the channel is gone.
    pub async fn recv(&mut self) -> Option<AuthMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if envelope.origin == self.origin => continue,
                Ok(envelope) => return Some(envelope.message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth channel lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn other_contexts_hear_sign_out() {
        let channel = AuthChannel::new();
        let first = channel.open();
        let second = channel.open();
        let mut heard = second.subscribe();

        first.publish(AuthMessage::SignOut);

        assert_eq!(heard.recv().await, Some(AuthMessage::SignOut));
    }

    #[tokio::test]
    async fn a_context_does_not_hear_itself() {
        let channel = AuthChannel::new();
        let first = channel.open();
        let second = channel.open();
        let mut own = first.subscribe();

        first.publish(AuthMessage::SignOut);
        second.publish(AuthMessage::SignOut);

        // only the message from `second` comes through
        assert_eq!(own.recv().await, Some(AuthMessage::SignOut));
        assert!(own.receiver.is_empty());
    }

    #[test]
    fn sign_out_serializes_as_its_wire_name() {
        assert_eq!(
            serde_json::to_string(&AuthMessage::SignOut).unwrap(),
            "\"signOut\""
        );
        assert_eq!(AuthChannel::new().name(), "auth");
    }
}
