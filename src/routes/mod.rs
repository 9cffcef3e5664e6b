mod auth;
mod health_check;

pub use auth::{change_password, get_current_user, get_login_logs, login, logout, refresh};
pub use health_check::health_check;
