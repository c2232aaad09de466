//! Store en memoria
//!
//! Implementa los cuatro repositorios sobre `HashMap`s protegidos por
//! `RwLock`. La guarda y la escritura se evalúan bajo el mismo lock de
//! escritura, con la misma semántica que `SELECT ... FOR UPDATE` en PostgreSQL.
//! Se usa con `STORAGE_BACKEND=memory` y en los tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    DriverFilters, DriverRepository, ExpenseFilters, ExpenseRepository, Pagination, StatusGuard,
    TripFilters, TripRepository, UpdateOutcome, VehicleFilters, VehicleRepository,
};
use crate::models::{
    Driver, DriverPatch, DriverStatus, Expense, Trip, TripPatch, TripStatus, Vehicle,
    VehiclePatch, VehicleStatus,
};
use crate::utils::errors::{duplicate_key_error, AppResult};

#[derive(Default)]
pub struct MemoryStore {
    vehicles: RwLock<HashMap<Uuid, Vehicle>>,
    drivers: RwLock<HashMap<Uuid, Driver>>,
    trips: RwLock<HashMap<Uuid, Trip>>,
    expenses: RwLock<Vec<Expense>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Más recientes primero, luego la página pedida
fn paginate<T: Clone>(
    mut items: Vec<T>,
    created_at: impl Fn(&T) -> chrono::DateTime<Utc>,
    pagination: Pagination,
) -> Vec<T> {
    items.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    items
        .into_iter()
        .skip(pagination.offset() as usize)
        .take(pagination.limit as usize)
        .collect()
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let mut vehicles = self.vehicles.write().await;
        if vehicles
            .values()
            .any(|v| v.license_plate == vehicle.license_plate)
        {
            return Err(duplicate_key_error(
                "Vehicle",
                "license plate",
                &vehicle.license_plate,
            ));
        }
        vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        Ok(self.vehicles.read().await.get(&id).cloned())
    }

    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        let vehicles = self.vehicles.read().await;
        Ok(vehicles
            .values()
            .find(|v| v.license_plate == license_plate)
            .cloned())
    }

    async fn list(&self, filters: &VehicleFilters, pagination: Pagination) -> AppResult<Vec<Vehicle>> {
        let vehicles = self.vehicles.read().await;
        let matching = vehicles.values().filter(|v| filters.matches(v)).cloned().collect();
        Ok(paginate(matching, |v: &Vehicle| v.created_at, pagination))
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<VehicleStatus>,
        patch: &VehiclePatch,
    ) -> AppResult<UpdateOutcome<Vehicle>> {
        let mut vehicles = self.vehicles.write().await;
        let Some(current) = vehicles.get(&id).cloned() else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !guard.admits(&current.status) {
            return Ok(UpdateOutcome::Conflict(current));
        }

        patch.check_odometer(&current)?;

        let updated = patch.apply(&current, Utc::now());
        if updated.license_plate != current.license_plate
            && vehicles
                .values()
                .any(|v| v.id != id && v.license_plate == updated.license_plate)
        {
            return Err(duplicate_key_error(
                "Vehicle",
                "license plate",
                &updated.license_plate,
            ));
        }
        vehicles.insert(id, updated.clone());
        Ok(UpdateOutcome::Updated(updated))
    }
}

#[async_trait]
impl DriverRepository for MemoryStore {
    async fn create(&self, driver: &Driver) -> AppResult<Driver> {
        let mut drivers = self.drivers.write().await;
        if drivers
            .values()
            .any(|d| d.license_number == driver.license_number)
        {
            return Err(duplicate_key_error(
                "Driver",
                "license number",
                &driver.license_number,
            ));
        }
        drivers.insert(driver.id, driver.clone());
        Ok(driver.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        Ok(self.drivers.read().await.get(&id).cloned())
    }

    async fn find_by_license_number(&self, license_number: &str) -> AppResult<Option<Driver>> {
        let drivers = self.drivers.read().await;
        Ok(drivers
            .values()
            .find(|d| d.license_number == license_number)
            .cloned())
    }

    async fn list(&self, filters: &DriverFilters, pagination: Pagination) -> AppResult<Vec<Driver>> {
        let drivers = self.drivers.read().await;
        let matching = drivers.values().filter(|d| filters.matches(d)).cloned().collect();
        Ok(paginate(matching, |d: &Driver| d.created_at, pagination))
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<DriverStatus>,
        patch: &DriverPatch,
    ) -> AppResult<UpdateOutcome<Driver>> {
        let mut drivers = self.drivers.write().await;
        let Some(current) = drivers.get(&id).cloned() else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !guard.admits(&current.status) {
            return Ok(UpdateOutcome::Conflict(current));
        }

        let updated = patch.apply(&current, Utc::now());
        if updated.license_number != current.license_number
            && drivers
                .values()
                .any(|d| d.id != id && d.license_number == updated.license_number)
        {
            return Err(duplicate_key_error(
                "Driver",
                "license number",
                &updated.license_number,
            ));
        }
        drivers.insert(id, updated.clone());
        Ok(UpdateOutcome::Updated(updated))
    }
}

#[async_trait]
impl TripRepository for MemoryStore {
    async fn create(&self, trip: &Trip) -> AppResult<Trip> {
        self.trips.write().await.insert(trip.id, trip.clone());
        Ok(trip.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>> {
        Ok(self.trips.read().await.get(&id).cloned())
    }

    async fn list(&self, filters: &TripFilters, pagination: Pagination) -> AppResult<Vec<Trip>> {
        let trips = self.trips.read().await;
        let matching = trips.values().filter(|t| filters.matches(t)).cloned().collect();
        Ok(paginate(matching, |t: &Trip| t.created_at, pagination))
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<TripStatus>,
        patch: &TripPatch,
    ) -> AppResult<UpdateOutcome<Trip>> {
        let mut trips = self.trips.write().await;
        let Some(current) = trips.get(&id).cloned() else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !guard.admits(&current.status) {
            return Ok(UpdateOutcome::Conflict(current));
        }

        let updated = patch.apply(&current, Utc::now());
        trips.insert(id, updated.clone());
        Ok(UpdateOutcome::Updated(updated))
    }
}

#[async_trait]
impl ExpenseRepository for MemoryStore {
    async fn create(&self, expense: &Expense) -> AppResult<Expense> {
        self.expenses.write().await.push(expense.clone());
        Ok(expense.clone())
    }

    async fn list(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>> {
        let expenses = self.expenses.read().await;
        let mut matching: Vec<Expense> = expenses
            .iter()
            .filter(|e| filters.matches(e))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(matching)
    }
}
