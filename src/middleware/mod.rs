/// Middleware module
///
/// Request-level authentication for protected routes.

mod auth_middleware;

pub use auth_middleware::AuthMiddleware;
