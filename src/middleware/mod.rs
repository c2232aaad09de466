//! Middleware del sistema
//!
//! Autenticación por bearer token, control de roles y CORS.

pub mod auth;
pub mod cors;

pub use auth::require_role;
pub use cors::cors_layer;
