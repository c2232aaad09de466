//! Ciclo de vida de conductores y safety score

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Driver, DriverPatch, NewDriver};
use crate::repositories::{DriverFilters, Pagination, Repositories, StatusGuard, UpdateOutcome};
use crate::utils::errors::{duplicate_key_error, not_found_error, validation_error, AppResult};

#[derive(Clone)]
pub struct DriverService {
    repositories: Repositories,
}

impl DriverService {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }

    pub async fn register(&self, new: NewDriver) -> AppResult<Driver> {
        let license_number = new.license_number.trim().to_string();
        if license_number.is_empty() {
            return Err(validation_error("license_number", "is required"));
        }
        if self
            .repositories
            .drivers
            .find_by_license_number(&license_number)
            .await?
            .is_some()
        {
            return Err(duplicate_key_error("Driver", "license number", &license_number));
        }

        let driver = self
            .repositories
            .drivers
            .create(&Driver::register(new, Utc::now()))
            .await?;

        info!("🧑‍✈️ Conductor registrado: {} ({}, {})", driver.name, driver.id, driver.status);
        Ok(driver)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Driver> {
        self.repositories
            .drivers
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_error("Driver", &id.to_string()))
    }

    pub async fn list(&self, filters: &DriverFilters, pagination: Pagination) -> AppResult<Vec<Driver>> {
        debug!("📋 Listando conductores {:?} {:?}", filters, pagination);
        self.repositories.drivers.list(filters, pagination).await
    }

    /// Actualiza datos del conductor. Score y contadores no son editables.
    pub async fn update(&self, id: Uuid, mut patch: DriverPatch) -> AppResult<Driver> {
        patch.total_trips_delta = 0;
        patch.completed_trips_delta = 0;
        patch.complaints_delta = 0;
        patch.recompute_safety_score = false;

        if let Some(number) = patch.license_number.as_mut() {
            *number = number.trim().to_string();
            if number.is_empty() {
                return Err(validation_error("license_number", "is required"));
            }
            if let Some(other) = self.repositories.drivers.find_by_license_number(number).await? {
                if other.id != id {
                    return Err(duplicate_key_error("Driver", "license number", number));
                }
            }
        }

        // Incluso un patch vacío pasa por el store: la regla de suspensión
        // se aplica en cada escritura
        let driver = self.write(id, &patch).await?;
        info!("✏️  Conductor actualizado: {} ({})", driver.name, driver.status);
        Ok(driver)
    }

    /// Recalcula el score a partir de los contadores actuales y lo persiste
    pub async fn recompute_safety_score(&self, id: Uuid) -> AppResult<Driver> {
        let patch = DriverPatch {
            recompute_safety_score: true,
            ..DriverPatch::default()
        };
        let driver = self.write(id, &patch).await?;
        debug!("📈 Safety score de {}: {:.2}", driver.name, driver.safety_score);
        Ok(driver)
    }

    /// Registra una queja; el score se recalcula en la misma escritura
    pub async fn report_complaint(&self, id: Uuid) -> AppResult<Driver> {
        let patch = DriverPatch {
            complaints_delta: 1,
            recompute_safety_score: true,
            ..DriverPatch::default()
        };
        let driver = self.write(id, &patch).await?;
        warn!(
            "⚠️  Queja registrada para {} (total {}, score {:.2})",
            driver.name, driver.complaints_count, driver.safety_score
        );
        Ok(driver)
    }

    async fn write(&self, id: Uuid, patch: &DriverPatch) -> AppResult<Driver> {
        match self
            .repositories
            .drivers
            .update_conditional(id, StatusGuard::Any, patch)
            .await?
        {
            UpdateOutcome::Updated(driver) => Ok(driver),
            UpdateOutcome::Conflict(_) | UpdateOutcome::NotFound => {
                Err(not_found_error("Driver", &id.to_string()))
            }
        }
    }
}
