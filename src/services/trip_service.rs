//! Servicio de viajes
//!
//! Crea viajes en Draft y ejecuta las transiciones del workflow. Vehículo y
//! conductor se vuelven a leer en cada transición, nunca se cachean en el
//! viaje.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use super::workflow::{
    execute_plan, plan_cancel, plan_complete, plan_dispatch, CompletionInput, TransitionOutcome,
};
use crate::models::{Driver, NewTrip, Trip, Vehicle};
use crate::repositories::{Pagination, Repositories, TripFilters};
use crate::utils::errors::{not_found_error, AppError, AppResult};
use crate::utils::validation::require_positive;

/// Datos para crear un viaje en Draft
#[derive(Debug, Clone)]
pub struct CreateTripInput {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub cargo_weight: f64,
    pub origin: String,
    pub destination: String,
    pub estimated_fuel_cost: Decimal,
    pub revenue: Decimal,
}

#[derive(Clone)]
pub struct TripService {
    repositories: Repositories,
}

impl TripService {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }

    /// Crea el viaje en Draft. No toca vehículo ni conductor.
    pub async fn create(&self, input: CreateTripInput) -> AppResult<Trip> {
        let vehicle = self.vehicle(input.vehicle_id).await?;
        self.driver(input.driver_id).await?;

        require_positive("cargo_weight", input.cargo_weight)?;
        if input.cargo_weight > vehicle.max_load_capacity {
            return Err(AppError::CapacityExceeded {
                cargo_weight: input.cargo_weight,
                max_load_capacity: vehicle.max_load_capacity,
            });
        }

        let trip = Trip::draft(
            NewTrip {
                vehicle_id: input.vehicle_id,
                driver_id: input.driver_id,
                cargo_weight: input.cargo_weight,
                origin: input.origin,
                destination: input.destination,
                estimated_fuel_cost: input.estimated_fuel_cost,
                revenue: input.revenue,
            },
            Utc::now(),
        );
        let created = self.repositories.trips.create(&trip).await?;

        info!(
            "📝 Viaje {} creado en Draft: {} → {} ({} kg)",
            created.id, created.origin, created.destination, created.cargo_weight
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Trip> {
        self.repositories
            .trips
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Trip", &id.to_string()))
    }

    pub async fn list(&self, filters: &TripFilters, pagination: Pagination) -> AppResult<Vec<Trip>> {
        debug!("📋 Listando viajes {:?} {:?}", filters, pagination);
        self.repositories.trips.list(filters, pagination).await
    }

    /// Draft → Dispatched
    pub async fn dispatch(&self, id: Uuid) -> AppResult<TransitionOutcome> {
        let (trip, vehicle, driver) = self.resolve(id).await?;
        let plan = plan_dispatch(&trip, &vehicle, &driver, Utc::now())?;
        execute_plan(&self.repositories, &plan).await
    }

    /// Dispatched → Completed
    pub async fn complete(&self, id: Uuid, input: CompletionInput) -> AppResult<TransitionOutcome> {
        let (trip, vehicle, driver) = self.resolve(id).await?;
        let plan = plan_complete(&trip, &vehicle, &driver, input, Utc::now())?;
        execute_plan(&self.repositories, &plan).await
    }

    /// Dispatched → Cancelled
    pub async fn cancel(&self, id: Uuid) -> AppResult<TransitionOutcome> {
        let (trip, vehicle, driver) = self.resolve(id).await?;
        let plan = plan_cancel(&trip, &vehicle, &driver, Utc::now())?;
        execute_plan(&self.repositories, &plan).await
    }

    async fn resolve(&self, id: Uuid) -> AppResult<(Trip, Vehicle, Driver)> {
        let trip = self.get(id).await?;
        let vehicle = self.vehicle(trip.vehicle_id).await?;
        let driver = self.driver(trip.driver_id).await?;
        Ok((trip, vehicle, driver))
    }

    async fn vehicle(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repositories
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    async fn driver(&self, id: Uuid) -> AppResult<Driver> {
        self.repositories
            .drivers
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))
    }
}
