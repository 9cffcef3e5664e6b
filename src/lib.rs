pub mod auth;
pub mod configuration;
pub mod crypto;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;
