//! Services module
//!
//! Este módulo contiene la lógica de negocio de la flota. Los servicios no
//! guardan estado propio: operan sobre los handles de [`Repositories`]
//! inyectados en el arranque.
//!
//! [`Repositories`]: crate::repositories::Repositories

pub mod driver_service;
pub mod expense_service;
pub mod trip_service;
pub mod vehicle_service;
pub mod workflow;

pub use driver_service::DriverService;
pub use expense_service::ExpenseService;
pub use trip_service::{CreateTripInput, TripService};
pub use vehicle_service::VehicleService;
pub use workflow::{CompletionInput, TransitionOutcome, TransitionPlan};
