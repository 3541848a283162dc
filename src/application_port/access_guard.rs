use serde::Deserialize;

/// What a protected view requires of the signed-in user. Both lists empty
/// means "authenticated, otherwise unconstrained".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardOptions {
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl GuardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub destination: String,
    pub permanent: bool,
}

impl Redirect {
    pub fn temporary(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            permanent: false,
        }
    }
}

/// Outcome of one guarded invocation.
#[derive(Debug)]
pub enum GuardDecision<T> {
    Allow(T),
    RedirectTo(Redirect),
    Rethrow(anyhow::Error),
}

impl<T> GuardDecision<T> {
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            GuardDecision::RedirectTo(redirect) => Some(redirect),
            _ => None,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, GuardDecision::Allow(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}
