use std::fmt;
use std::sync::Arc;

/// Moves an interactive client to another view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, destination: &str);
}

/// Where a client instance runs.
///
/// An interactive client can navigate by itself, so an unrecoverable auth
/// failure signs out and leaves the current view. A server-rendering client
/// cannot; it reports `ApiError::AuthTokenInvalid` and lets the enclosing guard
/// clear the session and answer with a redirect.
#[derive(Clone)]
pub enum ExecutionContext {
    Interactive { navigator: Arc<dyn Navigator> },
    ServerRender,
}

impl ExecutionContext {
    pub fn interactive(navigator: Arc<dyn Navigator>) -> Self {
        ExecutionContext::Interactive { navigator }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, ExecutionContext::Interactive { .. })
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionContext::Interactive { .. } => f.write_str("Interactive"),
            ExecutionContext::ServerRender => f.write_str("ServerRender"),
        }
    }
}
