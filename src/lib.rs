//! Backend de operaciones de flota
//!
//! Vehículos, conductores, viajes y gastos detrás de una API axum. El núcleo
//! es el workflow de viajes (`services::workflow`), que coordina las
//! escrituras condicionales sobre Trip, Vehicle y Driver.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::cors_layer;
use crate::state::AppState;

/// Requests atendidas en paralelo antes de encolar
const MAX_CONCURRENT_REQUESTS: usize = 512;

/// Construye la aplicación completa con sus capas
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    routes::create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
                .layer(cors),
        )
        .with_state(state)
}
