//! Ciclo de vida de vehículos
//!
//! Registro y actualización manual. El estado lo mueven sobre todo el
//! workflow de viajes y los gastos de mantenimiento.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::vehicle::normalize_license_plate;
use crate::models::{NewVehicle, Vehicle, VehiclePatch};
use crate::repositories::{Pagination, Repositories, StatusGuard, UpdateOutcome, VehicleFilters};
use crate::utils::errors::{duplicate_key_error, not_found_error, AppResult};
use crate::utils::validation::{require_license_plate, require_non_negative, require_positive};

#[derive(Clone)]
pub struct VehicleService {
    repositories: Repositories,
}

impl VehicleService {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }

    /// Registra un vehículo nuevo en estado Available
    pub async fn register(&self, new: NewVehicle) -> AppResult<Vehicle> {
        let plate = normalize_license_plate(&new.license_plate);
        require_license_plate(&plate)?;
        require_positive("max_load_capacity", new.max_load_capacity)?;
        require_non_negative("odometer", new.odometer)?;

        if self
            .repositories
            .vehicles
            .find_by_license_plate(&plate)
            .await?
            .is_some()
        {
            return Err(duplicate_key_error("Vehicle", "license plate", &plate));
        }

        let vehicle = Vehicle::register(new, Utc::now());
        let created = self.repositories.vehicles.create(&vehicle).await?;
        info!("🚚 Vehículo registrado: {} ({})", created.license_plate, created.id);
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Vehicle> {
        self.repositories
            .vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Vehicle", &id.to_string()))
    }

    pub async fn list(&self, filters: &VehicleFilters, pagination: Pagination) -> AppResult<Vec<Vehicle>> {
        debug!("📋 Listando vehículos {:?} {:?}", filters, pagination);
        self.repositories.vehicles.list(filters, pagination).await
    }

    /// Actualiza campos sueltos. El odómetro nunca puede bajar.
    pub async fn update_fields(&self, id: Uuid, mut patch: VehiclePatch) -> AppResult<Vehicle> {
        let current = self.get(id).await?;

        if let Some(odometer) = patch.odometer {
            require_non_negative("odometer", odometer)?;
            // El store vuelve a comprobarlo sobre el registro bloqueado
            patch.monotonic_odometer = true;
            patch.check_odometer(&current)?;
        }
        if let Some(capacity) = patch.max_load_capacity {
            require_positive("max_load_capacity", capacity)?;
        }
        if let Some(raw) = patch.license_plate.take() {
            let plate = normalize_license_plate(&raw);
            require_license_plate(&plate)?;
            if plate != current.license_plate {
                if let Some(other) = self.repositories.vehicles.find_by_license_plate(&plate).await? {
                    if other.id != id {
                        return Err(duplicate_key_error("Vehicle", "license plate", &plate));
                    }
                }
            }
            patch.license_plate = Some(plate);
        }

        if patch.is_empty() {
            return Ok(current);
        }

        match self
            .repositories
            .vehicles
            .update_conditional(id, StatusGuard::Any, &patch)
            .await?
        {
            UpdateOutcome::Updated(vehicle) => {
                info!("✏️  Vehículo actualizado: {} ({})", vehicle.license_plate, vehicle.status);
                Ok(vehicle)
            }
            UpdateOutcome::Conflict(_) | UpdateOutcome::NotFound => {
                Err(not_found_error("Vehicle", &id.to_string()))
            }
        }
    }
}
