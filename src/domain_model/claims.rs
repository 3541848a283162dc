use serde::Deserialize;
use std::collections::BTreeSet;

/// Role that satisfies every role requirement.
pub const ADMINISTRATOR_ROLE: &str = "administrator";

/// Permission and role claims carried by an access token.
///
/// Advisory only: the API stays authoritative, so a decision taken on a stale
/// claim set gates navigation, not data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClaimSet {
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl ClaimSet {
    pub fn new<P, R>(permissions: P, roles: R) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_administrator(&self) -> bool {
        self.has_role(ADMINISTRATOR_ROLE)
    }
}
