//! Rutas de la API
//!
//! Todo cuelga de `/api/v1`, salvo el health check.

pub mod driver_routes;
pub mod expense_routes;
pub mod trip_routes;
pub mod vehicle_routes;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    let api = Router::new()
        .nest("/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/drivers", driver_routes::create_driver_router())
        .nest("/trips", trip_routes::create_trip_router())
        .nest("/expenses", expense_routes::create_expense_router());

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "success": true,
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
