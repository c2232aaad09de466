//! DTOs (Data Transfer Objects)
//!
//! Formas de request/response de la API. Los campos viajan en camelCase,
//! como los envía el dashboard.

pub mod api_response;
pub mod driver_dto;
pub mod expense_dto;
pub mod trip_dto;
pub mod vehicle_dto;

pub use api_response::ApiResponse;
