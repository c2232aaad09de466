//! Autenticación JWT y control de roles
//!
//! `AuthenticatedUser` se extrae directamente en los handlers: sin header
//! `Authorization: Bearer <token>` válido la request termina en 401.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::debug;

use crate::{
    models::auth::{AuthenticatedUser, Role},
    state::AppState,
    utils::{
        errors::AppError,
        jwt::{authenticated_user, extract_token_from_header, verify_token, JwtConfig},
    },
};

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Not authorized to access this route".to_string()))?;

        let token = extract_token_from_header(auth_header)?;
        let claims = verify_token(token, &JwtConfig::from(&state.config)).map_err(|e| {
            debug!("🔒 Token rechazado: {}", e);
            AppError::Unauthorized("Not authorized to access this route".to_string())
        })?;

        authenticated_user(&claims)
    }
}

/// Falla con 403 si el rol del usuario no está en `allowed`
pub fn require_role(user: &AuthenticatedUser, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&user.role) {
        return Ok(());
    }
    Err(AppError::Forbidden(format!(
        "User role {} is not authorized to access this route",
        user.role
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_require_role() {
        let user = AuthenticatedUser {
            user_id: Uuid::new_v4(),
            role: Role::SafetyOfficer,
        };
        assert!(require_role(&user, &[Role::FleetManager, Role::SafetyOfficer]).is_ok());

        let err = require_role(&user, &[Role::Dispatcher]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(err.to_string().contains("Safety Officer"));
    }
}
