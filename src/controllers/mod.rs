//! Controllers
//!
//! Validan el request, llaman al servicio y envuelven el resultado en
//! [`ApiResponse`](crate::dto::ApiResponse).

pub mod driver_controller;
pub mod expense_controller;
pub mod trip_controller;
pub mod vehicle_controller;

pub use driver_controller::DriverController;
pub use expense_controller::ExpenseController;
pub use trip_controller::TripController;
pub use vehicle_controller::VehicleController;
