/// Authentication Routes
///
/// Login, token refresh, logout, and the session-owner endpoints
/// (current user, password change, login history).

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{
    delete_refresh_token, find_refresh_token, generate_refresh_token, has_role, hash_password,
    issue_access_token, load_identity, upsert_refresh_token, verify_password, Identity, Role,
};
use crate::configuration::JwtSettings;
use crate::crypto::FieldCodec;
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};

/// Shown in place of a contact field that failed to decrypt. One garbled
/// row must not fail the whole response.
const DECRYPTION_SENTINEL: &str = "****";

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub id: String,
    pub password: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Logout request
#[derive(Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Password change request
#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Login response: both tokens plus the minimal user payload the SPA
/// needs to route after login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub user: LoginUser,
}

#[derive(Serialize)]
pub struct LoginUser {
    pub id: String,
    pub name: String,
    pub role_id: String,
    pub first_login_yn: String,
}

/// Current-user response
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub position: Option<String>,
    pub department: Option<String>,
    pub role_id: String,
    pub phone_number: String,
    pub first_login_yn: String,
}

#[derive(Serialize)]
pub struct LoginLogEntry {
    pub login_at: String,
    pub user_id: String,
    pub name: String,
    pub ip_address: Option<String>,
}

/// Client address for the login log: first X-Forwarded-For entry when
/// behind a proxy, otherwise the peer address.
fn client_ip(req: &HttpRequest) -> Option<String> {
    if let Some(forwarded) = req.headers().get("X-Forwarded-For") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Some(first.to_string());
                }
            }
        }
    }
    req.peer_addr().map(|addr| addr.ip().to_string())
}

/// POST /auth/login
///
/// Authenticate with id and password. On success issues a 30-minute
/// access token and a 2-week opaque refresh token, replacing any refresh
/// token from a previous login for this user.
///
/// # Errors
/// - 400: id or password missing
/// - 401: wrong password
/// - 404: unknown or soft-deleted user
/// - 500: storage failure
pub async fn login(
    form: web::Json<LoginRequest>,
    req: HttpRequest,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("login");

    if form.id.is_empty() {
        return Err(ValidationError::EmptyField("id".to_string()).into());
    }
    if form.password.is_empty() {
        return Err(ValidationError::EmptyField("password".to_string()).into());
    }

    let user = sqlx::query_as::<_, (String, String, String, String, String)>(
        r#"
        SELECT id, name, role_id, password, first_login_yn
        FROM tb_user
        WHERE id = $1 AND is_delete_yn = 'N'
        "#,
    )
    .bind(&form.id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(AuthError::UnknownIdentity)?;

    let (user_id, name, role_id, password_hash, first_login_yn) = user;

    if !verify_password(&form.password, &password_hash)? {
        return Err(AuthError::InvalidPassword.into());
    }

    let identity = Identity {
        user_id: user_id.clone(),
        name: name.clone(),
        role_id: role_id.clone(),
    };

    let access_token = issue_access_token(&identity, jwt_config.get_ref())?;
    let refresh_token = generate_refresh_token();

    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);
    let ip_address = client_ip(&req);

    upsert_refresh_token(
        pool.get_ref(),
        &user_id,
        &refresh_token,
        jwt_config.refresh_token_expiry,
        user_agent.as_deref(),
        ip_address.as_deref(),
    )
    .await?;

    sqlx::query("INSERT INTO tb_user_login_log (login_at, user_id, ip_address) VALUES ($1, $2, $3)")
        .bind(Utc::now())
        .bind(&user_id)
        .bind(ip_address.as_deref())
        .execute(pool.get_ref())
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "User logged in"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        message: "login successful".to_string(),
        access_token,
        refresh_token,
        user: LoginUser {
            id: user_id,
            name,
            role_id,
            first_login_yn,
        },
    }))
}

/// POST /auth/refresh
///
/// Exchange a refresh token for a new access token. Does not rotate the
/// refresh token; only a new login replaces it.
///
/// # Errors
/// - 401: refresh token missing, unknown, expired, or owner gone
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    pool: web::Data<PgPool>,
    jwt_config: web::Data<JwtSettings>,
) -> Result<HttpResponse, AppError> {
    if form.refresh_token.is_empty() {
        return Err(AuthError::MissingRefreshToken.into());
    }

    let record = find_refresh_token(pool.get_ref(), &form.refresh_token)
        .await?
        .ok_or(AuthError::InvalidRefreshToken)?;

    if record.expires_at < Utc::now() {
        return Err(AuthError::ExpiredRefreshToken.into());
    }

    let identity = load_identity(pool.get_ref(), &record.user_id)
        .await?
        .ok_or(AuthError::IdentityNotFound)?;

    let access_token = issue_access_token(&identity, jwt_config.get_ref())?;

    tracing::info!(user_id = %identity.user_id, "Access token reissued via refresh endpoint");

    Ok(HttpResponse::Ok().json(serde_json::json!({ "access_token": access_token })))
}

/// POST /auth/logout
///
/// Delete the matching refresh token row. Idempotent: logging out an
/// unknown or already-removed token still succeeds.
pub async fn logout(
    form: web::Json<LogoutRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    if !form.refresh_token.is_empty() {
        delete_refresh_token(pool.get_ref(), &form.refresh_token).await?;
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "logged out" })))
}

/// GET /api/me
///
/// Current authenticated user's profile. The stored phone number is
/// decrypted with the randomized codec; a failed decryption is replaced
/// with a sentinel instead of failing the response.
pub async fn get_current_user(
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
    codec: web::Data<FieldCodec>,
) -> Result<HttpResponse, AppError> {
    let row = sqlx::query_as::<_, (String, String, Option<String>, Option<String>, String, Option<String>, String)>(
        r#"
        SELECT id, name, position, department, role_id, phone_number, first_login_yn
        FROM tb_user
        WHERE id = $1 AND is_delete_yn = 'N'
        "#,
    )
    .bind(&identity.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(AuthError::UnknownIdentity)?;

    let (id, name, position, department, role_id, phone_number, first_login_yn) = row;

    let phone_number = match phone_number {
        Some(encrypted) => match codec.decrypt(&encrypted) {
            Ok(plain) => plain,
            Err(e) => {
                tracing::warn!(user_id = %id, error = %e, "Failed to decrypt phone number");
                DECRYPTION_SENTINEL.to_string()
            }
        },
        None => String::new(),
    };

    Ok(HttpResponse::Ok().json(UserResponse {
        id,
        name,
        position,
        department,
        role_id,
        phone_number,
        first_login_yn,
    }))
}

/// PUT /api/password
///
/// Change the caller's password. Clears the first-login flag and stamps
/// `updated_by` with the caller's own name.
///
/// # Errors
/// - 400: missing fields, wrong current password, or weak new password
/// - 404: user row gone or soft-deleted since the token was issued
pub async fn change_password(
    identity: web::ReqData<Identity>,
    form: web::Json<ChangePasswordRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("change_password").with_user_id(identity.user_id.clone());

    if form.old_password.is_empty() {
        return Err(ValidationError::EmptyField("old_password".to_string()).into());
    }
    if form.new_password.is_empty() {
        return Err(ValidationError::EmptyField("new_password".to_string()).into());
    }

    let stored_hash = sqlx::query_scalar::<_, String>(
        "SELECT password FROM tb_user WHERE id = $1 AND is_delete_yn = 'N'",
    )
    .bind(&identity.user_id)
    .fetch_optional(pool.get_ref())
    .await?
    .ok_or(AuthError::UnknownIdentity)?;

    if !verify_password(&form.old_password, &stored_hash)? {
        return Err(ValidationError::InvalidFormat(
            "current password does not match".to_string(),
        )
        .into());
    }

    let new_hash = hash_password(&form.new_password)?;

    sqlx::query(
        r#"
        UPDATE tb_user
        SET password = $1, first_login_yn = 'Y', updated_at = NOW(), updated_by = $2
        WHERE id = $3
        "#,
    )
    .bind(&new_hash)
    .bind(&identity.name)
    .bind(&identity.user_id)
    .execute(pool.get_ref())
    .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %identity.user_id,
        "Password changed"
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "password changed" })))
}

/// GET /api/login_logs
///
/// Login history for all users, most recent first. Admin only.
pub async fn get_login_logs(
    identity: web::ReqData<Identity>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    if !has_role(&identity, &[Role::AdAdmin]) {
        return Err(AuthError::InsufficientRole.into());
    }

    let rows = sqlx::query_as::<_, (DateTime<Utc>, String, String, Option<String>)>(
        r#"
        SELECT l.login_at, l.user_id, u.name, l.ip_address
        FROM tb_user_login_log l
        JOIN tb_user u ON l.user_id = u.id
        ORDER BY l.login_at DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    let logs: Vec<LoginLogEntry> = rows
        .into_iter()
        .map(|(login_at, user_id, name, ip_address)| LoginLogEntry {
            login_at: login_at.to_rfc3339(),
            user_id,
            name,
            ip_address,
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "logs": logs })))
}
