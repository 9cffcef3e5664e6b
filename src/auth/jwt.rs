/// Access Token Generation and Verification
///
/// HMAC-SHA256 signed tokens. Verification distinguishes plain expiry
/// from malformed or tampered tokens, since only expiry may trigger the
/// refresh flow.

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, Identity};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Issue a signed access token for `identity`.
///
/// Lifetime comes from `config.access_token_expiry` (30 minutes in
/// production). A misconfigured signing key is the only failure mode.
pub fn issue_access_token(identity: &Identity, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(identity, config.access_token_expiry);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Verify signature and expiry, returning the embedded claims.
///
/// # Errors
/// - `AuthError::ExpiredAccessToken` when the signature is good but the
///   token is past its exp claim
/// - `AuthError::MalformedToken` for everything else (bad signature,
///   unparseable token, wrong algorithm)
pub fn verify_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // No leeway: an expired token must be reported as expired immediately
    // so the refresh flow kicks in.
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredAccessToken,
        _ => {
            tracing::warn!("Access token verification error: {}", e);
            AuthError::MalformedToken
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 1800,
            refresh_token_expiry: 1209600,
        }
    }

    fn test_identity() -> Identity {
        Identity {
            user_id: "u1".to_string(),
            name: "Test User".to_string(),
            role_id: "AD_ADMIN".to_string(),
        }
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let config = get_test_config();
        let token = issue_access_token(&test_identity(), &config).expect("Failed to issue token");
        let claims = verify_access_token(&token, &config).expect("Failed to verify token");

        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.name, "Test User");
        assert_eq!(claims.role_id, "AD_ADMIN");
        assert_eq!(claims.updated_by, "Test User");
    }

    #[test]
    fn garbage_token_is_malformed() {
        let config = get_test_config();
        let result = verify_access_token("not.a.token", &config);

        assert_eq!(result.unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn tampered_token_is_malformed_not_expired() {
        let config = get_test_config();
        let token = issue_access_token(&test_identity(), &config).expect("Failed to issue token");

        let tampered = format!("{}X", token);
        let result = verify_access_token(&tampered, &config);

        assert_eq!(result.unwrap_err(), AuthError::MalformedToken);
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let mut config = get_test_config();
        config.access_token_expiry = -60;

        let token = issue_access_token(&test_identity(), &config).expect("Failed to issue token");
        let result = verify_access_token(&token, &config);

        assert_eq!(result.unwrap_err(), AuthError::ExpiredAccessToken);
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let config = get_test_config();
        let token = issue_access_token(&test_identity(), &config).expect("Failed to issue token");

        let mut other = get_test_config();
        other.secret = "a-completely-different-signing-secret!!".to_string();
        let result = verify_access_token(&token, &other);

        assert_eq!(result.unwrap_err(), AuthError::MalformedToken);
    }
}
