use crate::application_port::*;
use crate::domain_model::*;

/// Every required permission must be held. Every required role must be held
/// too, unless the user is an administrator, which stands in for any role but
/// never for a permission.
pub fn evaluate(options: &GuardOptions, claims: &ClaimSet) -> Access {
    let has_permissions = options
        .permissions
        .iter()
        .all(|permission| claims.has_permission(permission));

    let has_roles =
        claims.is_administrator() || options.roles.iter().all(|role| claims.has_role(role));

    if has_permissions && has_roles {
        Access::Allow
    } else {
        Access::Deny
    }
}
