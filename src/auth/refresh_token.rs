/// Refresh Token Store
///
/// Opaque, unguessable tokens persisted server-side, one live row per
/// user. A new login overwrites the previous row (upsert), so logging in
/// elsewhere invalidates a prior session's refresh capability. Tokens are
/// SHA-256 hashed before storage; lookups hash the presented token.

use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::error::AppError;

const TOKEN_LENGTH: usize = 32;

/// One row of the refresh token store.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a new opaque refresh token.
///
/// 32 alphanumeric characters (~190 bits of randomness). Carries no
/// embedded claims; it can only be looked up, never decoded.
pub fn generate_refresh_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Store a refresh token for `user_id`, replacing any existing row.
///
/// Last write wins: two near-simultaneous logins for the same user race,
/// and the earlier token silently becomes unusable.
pub async fn upsert_refresh_token(
    pool: &PgPool,
    user_id: &str,
    token: &str,
    expiry_seconds: i64,
    user_agent: Option<&str>,
    ip_address: Option<&str>,
) -> Result<(), AppError> {
    let token_hash = hash_token(token);
    let expires_at = Utc::now() + Duration::seconds(expiry_seconds);

    sqlx::query(
        r#"
        INSERT INTO tb_refresh_token (user_id, token_hash, expires_at, user_agent, ip_address, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO UPDATE
        SET token_hash = EXCLUDED.token_hash,
            expires_at = EXCLUDED.expires_at,
            user_agent = EXCLUDED.user_agent,
            ip_address = EXCLUDED.ip_address,
            created_at = EXCLUDED.created_at
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .bind(user_agent)
    .bind(ip_address)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Look up a refresh token. Returns the owning user and stored expiry,
/// or `None` when no row matches. Expiry checking is the caller's job.
pub async fn find_refresh_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<RefreshTokenRecord>, AppError> {
    let token_hash = hash_token(token);

    let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(
        r#"
        SELECT user_id, expires_at
        FROM tb_refresh_token
        WHERE token_hash = $1
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(user_id, expires_at)| RefreshTokenRecord {
        user_id,
        expires_at,
    }))
}

/// Delete the row for a refresh token (logout). Deleting a token that
/// does not exist is not an error.
pub async fn delete_refresh_token(pool: &PgPool, token: &str) -> Result<(), AppError> {
    let token_hash = hash_token(token);

    sqlx::query("DELETE FROM tb_refresh_token WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_refresh_token() {
        let token = generate_refresh_token();

        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn generated_tokens_are_unique() {
        let token1 = generate_refresh_token();
        let token2 = generate_refresh_token();

        assert_ne!(token1, token2);
    }

    #[test]
    fn test_token_hashing() {
        let token = generate_refresh_token();
        let hash1 = hash_token(&token);
        let hash2 = hash_token(&token);

        // Same token, same hash; hash never equals the plaintext
        assert_eq!(hash1, hash2);
        assert_ne!(token, hash1);
        // SHA-256 hex
        assert_eq!(hash1.len(), 64);
    }
}
