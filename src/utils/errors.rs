//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::{DriverStatus, TripStatus, VehicleStatus, VehicleType};

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DuplicateKey(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error("Cargo weight {cargo_weight}kg exceeds vehicle capacity {max_load_capacity}kg")]
    CapacityExceeded { cargo_weight: f64, max_load_capacity: f64 },

    #[error("Vehicle {license_plate} is not available (Status: {status})")]
    VehicleUnavailable { license_plate: String, status: VehicleStatus },

    #[error("Driver {name} is not on duty (Status: {status})")]
    DriverUnavailable { name: String, status: DriverStatus },

    #[error("Driver {name} has an expired license")]
    LicenseExpired { name: String },

    #[error("Driver {name} is licensed for {license_category}, but vehicle is a {vehicle_type}")]
    LicenseCategoryMismatch {
        name: String,
        license_category: VehicleType,
        vehicle_type: VehicleType,
    },

    #[error("Final odometer ({final_odometer}) cannot be less than current ({current})")]
    OdometerRegression { final_odometer: f64, current: f64 },

    #[error("Odometer reading cannot decrease (current {current}, requested {requested})")]
    InvalidOdometer { current: f64, requested: f64 },

    #[error("Workflow inconsistency: {0}")]
    WorkflowInconsistency(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),
}

impl AppError {
    /// Código estable para que el cliente distinga cada tipo de error
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DB_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::DuplicateKey(_) => "DUPLICATE_KEY",
            AppError::InvalidTransition(_) => "INVALID_TRANSITION",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::VehicleUnavailable { .. } => "VEHICLE_UNAVAILABLE",
            AppError::DriverUnavailable { .. } => "DRIVER_UNAVAILABLE",
            AppError::LicenseExpired { .. } => "LICENSE_EXPIRED",
            AppError::LicenseCategoryMismatch { .. } => "LICENSE_CATEGORY_MISMATCH",
            AppError::OdometerRegression { .. } => "ODOMETER_REGRESSION",
            AppError::InvalidOdometer { .. } => "INVALID_ODOMETER",
            AppError::WorkflowInconsistency(_) => "WORKFLOW_INCONSISTENCY",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
            AppError::Jwt(_) => "JWT_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::WorkflowInconsistency(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateKey(_)
            | AppError::InvalidTransition(_)
            | AppError::VehicleUnavailable { .. }
            | AppError::DriverUnavailable { .. } => StatusCode::CONFLICT,
            AppError::CapacityExceeded { .. }
            | AppError::LicenseExpired { .. }
            | AppError::LicenseCategoryMismatch { .. }
            | AppError::OdometerRegression { .. }
            | AppError::InvalidOdometer { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn title(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "Bad Request",
            StatusCode::UNAUTHORIZED => "Unauthorized",
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::NOT_FOUND => "Not Found",
            StatusCode::CONFLICT => "Conflict",
            StatusCode::UNPROCESSABLE_ENTITY => "Business Rule Violation",
            _ => "Internal Server Error",
        }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    message: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, details) = match &self {
            AppError::Database(e) => {
                error!("❌ Database error: {}", e);
                (
                    "An error occurred while accessing the database".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                error!("❌ Internal error: {}", msg);
                ("An unexpected error occurred".to_string(), None)
            }
            AppError::WorkflowInconsistency(msg) => {
                error!("🚨 Workflow inconsistency, operator intervention required: {}", msg);
                (self.to_string(), None)
            }
            AppError::Validation(e) => {
                warn!("Validation error: {}", e);
                ("The provided data is invalid".to_string(), Some(json!(e)))
            }
            AppError::CapacityExceeded {
                cargo_weight,
                max_load_capacity,
            } => (
                self.to_string(),
                Some(json!({
                    "cargoWeight": cargo_weight,
                    "maxLoadCapacity": max_load_capacity,
                })),
            ),
            AppError::OdometerRegression {
                final_odometer,
                current,
            } => (
                self.to_string(),
                Some(json!({ "finalOdometer": final_odometer, "currentOdometer": current })),
            ),
            AppError::InvalidOdometer { current, requested } => (
                self.to_string(),
                Some(json!({ "currentOdometer": current, "requestedOdometer": requested })),
            ),
            other => {
                warn!("{} ({})", other, other.code());
                (other.to_string(), None)
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.title().to_string(),
            message,
            code: self.code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de clave duplicada
pub fn duplicate_key_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::DuplicateKey(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para transiciones de viaje no permitidas
pub fn invalid_transition_error(action: &str, required: TripStatus, current: TripStatus) -> AppError {
    AppError::InvalidTransition(format!(
        "Only {} trips can be {} (current status: {})",
        required, action, current
    ))
}

/// Convierte errores de escritura de sqlx, separando violaciones de unicidad
pub fn map_write_error(err: sqlx::Error, resource: &str) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::DuplicateKey(format!(
                "{} violates a unique constraint: {}",
                resource,
                db_err.message()
            ));
        }
    }
    AppError::Database(err)
}
