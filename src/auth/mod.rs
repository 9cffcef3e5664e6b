/// Authentication module
///
/// Covers the whole session lifecycle: access token issuance and
/// verification, refresh token storage, the validate-or-refresh core,
/// password hashing, and role checks.

mod authenticator;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod roles;

pub use authenticator::authenticate;
pub use authenticator::load_identity;
pub use authenticator::AuthOutcome;
pub use claims::Claims;
pub use claims::Identity;
pub use jwt::issue_access_token;
pub use jwt::verify_access_token;
pub use password::hash_password;
pub use password::verify_password;
pub use refresh_token::delete_refresh_token;
pub use refresh_token::find_refresh_token;
pub use refresh_token::generate_refresh_token;
pub use refresh_token::upsert_refresh_token;
pub use refresh_token::RefreshTokenRecord;
pub use roles::has_role;
pub use roles::Role;
