/// Role checks
///
/// Centralizes role comparisons so handlers never inline role-id string
/// literals.

use crate::auth::claims::Identity;

/// The role identifiers known to the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    AdAdmin,
    PrAdmin,
    PrManager,
    UsrGeneral,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::AdAdmin => "AD_ADMIN",
            Role::PrAdmin => "PR_ADMIN",
            Role::PrManager => "PR_MANAGER",
            Role::UsrGeneral => "USR_GENERAL",
        }
    }

    pub fn parse(role_id: &str) -> Option<Role> {
        match role_id {
            "AD_ADMIN" => Some(Role::AdAdmin),
            "PR_ADMIN" => Some(Role::PrAdmin),
            "PR_MANAGER" => Some(Role::PrManager),
            "USR_GENERAL" => Some(Role::UsrGeneral),
            _ => None,
        }
    }
}

/// Whether `identity` holds one of the `required` roles.
/// An unknown role_id never matches.
pub fn has_role(identity: &Identity, required: &[Role]) -> bool {
    match Role::parse(&identity.role_id) {
        Some(role) => required.contains(&role),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_with_role(role_id: &str) -> Identity {
        Identity {
            user_id: "u1".to_string(),
            name: "Test User".to_string(),
            role_id: role_id.to_string(),
        }
    }

    #[test]
    fn admin_matches_admin_requirement() {
        let identity = identity_with_role("AD_ADMIN");
        assert!(has_role(&identity, &[Role::AdAdmin]));
    }

    #[test]
    fn general_user_does_not_match_admin_requirement() {
        let identity = identity_with_role("USR_GENERAL");
        assert!(!has_role(&identity, &[Role::AdAdmin]));
        assert!(has_role(&identity, &[Role::AdAdmin, Role::UsrGeneral]));
    }

    #[test]
    fn unknown_role_never_matches() {
        let identity = identity_with_role("SOMETHING_ELSE");
        assert!(!has_role(
            &identity,
            &[Role::AdAdmin, Role::PrAdmin, Role::PrManager, Role::UsrGeneral]
        ));
    }

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::AdAdmin, Role::PrAdmin, Role::PrManager, Role::UsrGeneral] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }
}
