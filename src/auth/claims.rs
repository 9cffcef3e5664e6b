/// JWT Claims structure
///
/// Payload of an access token: the identity tuple plus expiry.

use serde::{Deserialize, Serialize};

/// One authenticated principal, as resource handlers see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub name: String,
    pub role_id: String,
}

/// Claims for access tokens.
///
/// `updated_by` carries the display name to stamp into `updated_by`
/// columns when the holder mutates a row.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub user_id: String,
    pub name: String,
    pub role_id: String,
    pub updated_by: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for `identity` expiring `lifetime_seconds` from now.
    pub fn new(identity: &Identity, lifetime_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            user_id: identity.user_id.clone(),
            name: identity.name.clone(),
            role_id: identity.role_id.clone(),
            updated_by: identity.name.clone(),
            exp: now + lifetime_seconds,
        }
    }

    /// The identity tuple embedded in the token.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            role_id: self.role_id.clone(),
        }
    }

    /// Check if the token has expired.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp();
        self.exp < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identity() -> Identity {
        Identity {
            user_id: "u1".to_string(),
            name: "Test User".to_string(),
            role_id: "USR_GENERAL".to_string(),
        }
    }

    #[test]
    fn claims_carry_the_identity_tuple() {
        let claims = Claims::new(&test_identity(), 1800);

        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.name, "Test User");
        assert_eq!(claims.role_id, "USR_GENERAL");
        assert_eq!(claims.updated_by, "Test User");
        assert!(!claims.is_expired());
    }

    #[test]
    fn identity_round_trips_through_claims() {
        let identity = test_identity();
        let claims = Claims::new(&identity, 1800);
        let recovered = claims.identity();

        assert_eq!(recovered.user_id, identity.user_id);
        assert_eq!(recovered.name, identity.name);
        assert_eq!(recovered.role_id, identity.role_id);
    }

    #[test]
    fn negative_lifetime_is_expired() {
        let claims = Claims::new(&test_identity(), -60);
        assert!(claims.is_expired());
    }
}
