//! Repositorios (Entity Store)
//!
//! Cada entidad expone un trait asíncrono con dos implementaciones:
//! PostgreSQL (`Pg*Repository`) y memoria ([`memory::MemoryStore`]).
//! Las escrituras de estado pasan por `update_conditional`, que evalúa la
//! guarda y aplica el patch de forma atómica.

pub mod driver_repository;
pub mod expense_repository;
pub mod memory;
pub mod trip_repository;
pub mod vehicle_repository;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    Driver, DriverPatch, DriverStatus, Expense, ExpenseType, Trip, TripPatch, TripStatus, Vehicle,
    VehiclePatch, VehicleStatus, VehicleType,
};
use crate::utils::errors::AppResult;

pub use driver_repository::PgDriverRepository;
pub use expense_repository::PgExpenseRepository;
pub use memory::MemoryStore;
pub use trip_repository::PgTripRepository;
pub use vehicle_repository::PgVehicleRepository;

/// Condición sobre el estado actual que debe cumplirse para escribir
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusGuard<S> {
    Any,
    Is(S),
    Not(S),
}

impl<S: PartialEq> StatusGuard<S> {
    pub fn admits(&self, current: &S) -> bool {
        match self {
            StatusGuard::Any => true,
            StatusGuard::Is(expected) => expected == current,
            StatusGuard::Not(excluded) => excluded != current,
        }
    }
}

/// Resultado de una escritura condicional
#[derive(Debug, Clone)]
pub enum UpdateOutcome<T> {
    Updated(T),
    /// La guarda no se cumplió; contiene el registro actual sin modificar
    Conflict(T),
    NotFound,
}

impl<T> UpdateOutcome<T> {
    pub fn updated(self) -> Option<T> {
        match self {
            UpdateOutcome::Updated(record) => Some(record),
            _ => None,
        }
    }
}

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Paginación basada en página (1-indexada) y límite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Clone, Default)]
pub struct VehicleFilters {
    pub status: Option<VehicleStatus>,
    pub vehicle_type: Option<VehicleType>,
    pub region: Option<String>,
}

impl VehicleFilters {
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        self.status.map_or(true, |s| vehicle.status == s)
            && self.vehicle_type.map_or(true, |t| vehicle.vehicle_type == t)
            && self.region.as_ref().map_or(true, |r| &vehicle.region == r)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverFilters {
    pub status: Option<DriverStatus>,
}

impl DriverFilters {
    pub fn matches(&self, driver: &Driver) -> bool {
        self.status.map_or(true, |s| driver.status == s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TripFilters {
    pub status: Option<TripStatus>,
}

impl TripFilters {
    pub fn matches(&self, trip: &Trip) -> bool {
        self.status.map_or(true, |s| trip.status == s)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilters {
    pub vehicle_id: Option<Uuid>,
    pub expense_type: Option<ExpenseType>,
}

impl ExpenseFilters {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.vehicle_id.map_or(true, |id| expense.vehicle_id == id)
            && self.expense_type.map_or(true, |t| expense.expense_type == t)
    }
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Falla con `DuplicateKey` si la matrícula ya existe
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>>;
    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>>;
    async fn list(&self, filters: &VehicleFilters, pagination: Pagination) -> AppResult<Vec<Vehicle>>;
    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<VehicleStatus>,
        patch: &VehiclePatch,
    ) -> AppResult<UpdateOutcome<Vehicle>>;
}

#[async_trait]
pub trait DriverRepository: Send + Sync {
    /// Falla con `DuplicateKey` si el número de licencia ya existe
    async fn create(&self, driver: &Driver) -> AppResult<Driver>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>>;
    async fn find_by_license_number(&self, license_number: &str) -> AppResult<Option<Driver>>;
    async fn list(&self, filters: &DriverFilters, pagination: Pagination) -> AppResult<Vec<Driver>>;
    /// Aplica el patch y la regla de suspensión sobre el registro bloqueado
    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<DriverStatus>,
        patch: &DriverPatch,
    ) -> AppResult<UpdateOutcome<Driver>>;
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create(&self, trip: &Trip) -> AppResult<Trip>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>>;
    async fn list(&self, filters: &TripFilters, pagination: Pagination) -> AppResult<Vec<Trip>>;
    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<TripStatus>,
        patch: &TripPatch,
    ) -> AppResult<UpdateOutcome<Trip>>;
}

#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn create(&self, expense: &Expense) -> AppResult<Expense>;
    async fn list(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>>;
}

/// Handles a los cuatro repositorios, compartidos por todos los servicios
#[derive(Clone)]
pub struct Repositories {
    pub vehicles: Arc<dyn VehicleRepository>,
    pub drivers: Arc<dyn DriverRepository>,
    pub trips: Arc<dyn TripRepository>,
    pub expenses: Arc<dyn ExpenseRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            drivers: Arc::new(PgDriverRepository::new(pool.clone())),
            trips: Arc::new(PgTripRepository::new(pool.clone())),
            expenses: Arc::new(PgExpenseRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            vehicles: store.clone(),
            drivers: store.clone(),
            trips: store.clone(),
            expenses: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_guard() {
        assert!(StatusGuard::Any.admits(&VehicleStatus::Retired));
        assert!(StatusGuard::Is(VehicleStatus::Available).admits(&VehicleStatus::Available));
        assert!(!StatusGuard::Is(VehicleStatus::Available).admits(&VehicleStatus::OnTrip));
        assert!(StatusGuard::Not(VehicleStatus::Available).admits(&VehicleStatus::InShop));
        assert!(!StatusGuard::Not(VehicleStatus::Available).admits(&VehicleStatus::Available));
    }

    #[test]
    fn test_pagination_defaults_and_bounds() {
        let default = Pagination::default();
        assert_eq!((default.page, default.limit, default.offset()), (1, 10, 0));

        let page = Pagination::new(Some(3), Some(20));
        assert_eq!(page.offset(), 40);

        let clamped = Pagination::new(Some(0), Some(10_000));
        assert_eq!((clamped.page, clamped.limit), (1, MAX_PAGE_LIMIT));
    }
}
