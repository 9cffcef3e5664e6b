/// Unified Error Handling Module
///
/// Single error type for the whole service:
/// 1. Control flow errors (Result-based)
/// 2. HTTP responses with structured context
/// 3. Domain-specific error types (validation, storage, auth, crypto)
/// 4. Structured error logging with request context

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone)]
pub enum ValidationError {
    EmptyField(String),
    TooShort(String, usize),
    TooLong(String, usize),
    InvalidFormat(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is required", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{}", field),
        }
    }
}

impl StdError for ValidationError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    NotFound(String),
    QueryExecution(String),
    ConnectionPool(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::NotFound(msg) => write!(f, "Not found: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Authentication and authorization errors.
///
/// Every failure of the validate-or-refresh flow maps to exactly one variant,
/// so clients always get a distinguishing reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer token in the Authorization header.
    MissingCredential,
    /// Token present but unparseable or signature-tampered. Never refreshed.
    MalformedToken,
    /// Token correctly signed but past its exp claim.
    ExpiredAccessToken,
    /// Access token expired and no refresh token was supplied.
    MissingRefreshToken,
    /// Refresh token has no matching store row.
    InvalidRefreshToken,
    /// Refresh token row exists but is past its stored expiry.
    ExpiredRefreshToken,
    /// Refresh token row exists but its owner is gone or soft-deleted.
    IdentityNotFound,
    /// Login with a wrong password.
    InvalidPassword,
    /// Login with an id that has no live user row.
    UnknownIdentity,
    /// Authenticated but lacking the required role.
    InsufficientRole,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "missing token"),
            AuthError::MalformedToken => write!(f, "invalid token"),
            AuthError::ExpiredAccessToken => write!(f, "token expired"),
            AuthError::MissingRefreshToken => write!(f, "missing refresh token"),
            AuthError::InvalidRefreshToken => write!(f, "invalid refresh token"),
            AuthError::ExpiredRefreshToken => write!(f, "expired refresh token"),
            AuthError::IdentityNotFound => write!(f, "identity not found"),
            AuthError::InvalidPassword => write!(f, "invalid password"),
            AuthError::UnknownIdentity => write!(f, "user not found"),
            AuthError::InsufficientRole => write!(f, "insufficient role"),
        }
    }
}

impl StdError for AuthError {}

impl AuthError {
    fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "MISSING_TOKEN",
            AuthError::MalformedToken => "TOKEN_INVALID",
            AuthError::ExpiredAccessToken => "TOKEN_EXPIRED",
            AuthError::MissingRefreshToken => "REFRESH_TOKEN_MISSING",
            AuthError::InvalidRefreshToken => "REFRESH_TOKEN_INVALID",
            AuthError::ExpiredRefreshToken => "REFRESH_TOKEN_EXPIRED",
            AuthError::IdentityNotFound => "IDENTITY_NOT_FOUND",
            AuthError::InvalidPassword => "INVALID_CREDENTIALS",
            AuthError::UnknownIdentity => "USER_NOT_FOUND",
            AuthError::InsufficientRole => "FORBIDDEN",
        }
    }
}

/// Field encryption/decryption errors
#[derive(Debug, Clone)]
pub enum CryptoError {
    /// Ciphertext is not valid base64.
    InvalidEncoding(String),
    /// Ciphertext too short to carry an IV, or not block-aligned.
    MalformedCiphertext,
    /// Padding byte inconsistent with the block size.
    InvalidPadding,
    /// Decrypted bytes are not valid UTF-8.
    InvalidPlaintext,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidEncoding(msg) => write!(f, "base64 decode error: {}", msg),
            CryptoError::MalformedCiphertext => write!(f, "malformed ciphertext"),
            CryptoError::InvalidPadding => write!(f, "invalid padding"),
            CryptoError::InvalidPlaintext => write!(f, "decrypted data is not valid UTF-8"),
        }
    }
}

impl StdError for CryptoError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    MissingRequired(String),
    InvalidValue(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingRequired(msg) => write!(f, "Missing required config: {}", msg),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

/// Central error type that all application errors map to
#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Database(DatabaseError),
    Auth(AuthError),
    Crypto(CryptoError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Crypto(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<CryptoError> for AppError {
    fn from(err: CryptoError) -> Self {
        AppError::Crypto(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let error_msg = err.to_string();

        if error_msg.contains("duplicate key") || error_msg.contains("unique constraint") {
            AppError::Database(DatabaseError::UniqueConstraintViolation(
                "Record already exists".to_string(),
            ))
        } else if error_msg.contains("no rows") {
            AppError::Database(DatabaseError::NotFound("Record not found".to_string()))
        } else if error_msg.contains("pool") || error_msg.contains("connect") {
            AppError::Database(DatabaseError::ConnectionPool(error_msg))
        } else {
            AppError::Database(DatabaseError::UnexpectedError(error_msg))
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking (request ID or trace ID)
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            // Validation errors -> 400 Bad Request
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR".to_string(),
                e.to_string(),
            ),

            // Storage failures are fatal to the current request
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => (
                    StatusCode::CONFLICT,
                    "DUPLICATE_ENTRY".to_string(),
                    e.to_string(),
                ),
                DatabaseError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND".to_string(),
                    e.to_string(),
                ),
                _ => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR".to_string(),
                    "Database error occurred".to_string(),
                ),
            },

            AppError::Auth(e) => (self.status_code(), e.code().to_string(), e.to_string()),

            AppError::Crypto(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DECRYPTION_FAILURE".to_string(),
                "Failed to process encrypted field".to_string(),
            ),

            AppError::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR".to_string(),
                "Server configuration error".to_string(),
            ),

            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
            ),
        };

        let error_response =
            ErrorResponse::new(request_id.to_string(), message, code, status.as_u16());

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %e,
                    "Validation error"
                );
            }
            AppError::Database(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Database error"
                );
            }
            AppError::Auth(e) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %e,
                    "Authentication error"
                );
            }
            AppError::Crypto(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Field decryption error"
                );
            }
            AppError::Config(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Configuration error"
                );
            }
            AppError::Internal(msg) => {
                tracing::error!(
                    request_id = request_id,
                    error = %msg,
                    "Internal error"
                );
            }
        }
    }
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(e) => match e {
                DatabaseError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Auth(e) => match e {
                AuthError::UnknownIdentity => StatusCode::NOT_FOUND,
                AuthError::InsufficientRole => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            },
            AppError::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 4. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for enhanced logging and debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_have_distinguishing_messages() {
        let reasons = [
            AuthError::MissingCredential,
            AuthError::MalformedToken,
            AuthError::MissingRefreshToken,
            AuthError::InvalidRefreshToken,
            AuthError::ExpiredRefreshToken,
            AuthError::IdentityNotFound,
        ];
        let mut messages: Vec<String> = reasons.iter().map(|e| e.to_string()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), reasons.len());
    }

    #[test]
    fn unknown_identity_maps_to_404() {
        let err = AppError::Auth(AuthError::UnknownIdentity);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn refresh_failures_map_to_401() {
        for e in [
            AuthError::MissingRefreshToken,
            AuthError::InvalidRefreshToken,
            AuthError::ExpiredRefreshToken,
            AuthError::IdentityNotFound,
        ] {
            assert_eq!(AppError::Auth(e).status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn storage_failure_maps_to_500() {
        let err = AppError::Database(DatabaseError::ConnectionPool("refused".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_response_carries_code_and_status() {
        let err = AppError::Auth(AuthError::InvalidRefreshToken);
        let (status, body) = <AppError as ErrorHandler>::error_response(&err, "req-1");
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.code, "REFRESH_TOKEN_INVALID");
        assert_eq!(body.message, "invalid refresh token");
        assert_eq!(body.error_id, "req-1");
    }
}
