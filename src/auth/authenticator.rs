/// Token Validator / Refresher
///
/// The core of the session lifecycle: given the tokens from an inbound
/// request, produce an authenticated identity, a freshly minted access
/// token, or a rejection with a distinguishing reason.
///
/// The refresh result is terminal for the current request. Handlers must
/// propagate it to the client unresolved; the client retries with the
/// new access token. A refresh never completes the original operation.

use chrono::Utc;
use sqlx::PgPool;

use crate::auth::claims::Identity;
use crate::auth::jwt::{issue_access_token, verify_access_token};
use crate::auth::refresh_token::find_refresh_token;
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Result of authenticating a request.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// The access token was valid; the request may proceed as this identity.
    Authenticated(Identity),
    /// The access token had expired but the refresh token was good.
    /// The caller must return this token to the client and stop.
    Refreshed { access_token: String },
}

/// Validate an access token, transparently minting a new one when the
/// old one has expired and the refresh token is still valid.
///
/// The fast path (a valid access token) touches no storage. Only plain
/// expiry triggers the refresh lookup; a malformed or tampered token is
/// rejected outright.
pub async fn authenticate(
    pool: &PgPool,
    jwt_config: &JwtSettings,
    access_token: Option<&str>,
    refresh_token: Option<&str>,
) -> Result<AuthOutcome, AppError> {
    let access_token = access_token.ok_or(AuthError::MissingCredential)?;

    match verify_access_token(access_token, jwt_config) {
        Ok(claims) => Ok(AuthOutcome::Authenticated(claims.identity())),
        Err(AuthError::ExpiredAccessToken) => {
            let refresh_token = refresh_token.ok_or(AuthError::MissingRefreshToken)?;

            let record = find_refresh_token(pool, refresh_token)
                .await?
                .ok_or(AuthError::InvalidRefreshToken)?;

            if record.expires_at < Utc::now() {
                return Err(AuthError::ExpiredRefreshToken.into());
            }

            let identity = load_identity(pool, &record.user_id)
                .await?
                .ok_or(AuthError::IdentityNotFound)?;

            let access_token = issue_access_token(&identity, jwt_config)?;

            tracing::info!(user_id = %identity.user_id, "Access token refreshed");

            Ok(AuthOutcome::Refreshed { access_token })
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve a live identity by user id. Soft-deleted users do not resolve.
pub async fn load_identity(pool: &PgPool, user_id: &str) -> Result<Option<Identity>, AppError> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        r#"
        SELECT id, name, role_id
        FROM tb_user
        WHERE id = $1 AND is_delete_yn = 'N'
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(user_id, name, role_id)| Identity {
        user_id,
        name,
        role_id,
    }))
}
