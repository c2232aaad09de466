//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL, junto con los patches que aplican los stores.

pub mod auth;
pub mod driver;
pub mod expense;
pub mod trip;
pub mod vehicle;

pub use driver::{Driver, DriverPatch, DriverStatus, NewDriver};
pub use expense::{Expense, ExpenseType, NewExpense};
pub use trip::{NewTrip, Trip, TripPatch, TripStatus};
pub use vehicle::{NewVehicle, Vehicle, VehiclePatch, VehicleStatus, VehicleType};
