use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Pagination, StatusGuard, UpdateOutcome, VehicleFilters, VehicleRepository};
use crate::models::{Vehicle, VehiclePatch, VehicleStatus};
use crate::utils::errors::{map_write_error, AppError, AppResult};

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        let created = sqlx::query_as::<_, Vehicle>(
            r#"
            INSERT INTO vehicles (
                id, license_plate, model, vehicle_type, max_load_capacity, odometer, region,
                status, last_maintenance_date, last_trip_date, acquisition_cost, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(vehicle.id)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.model)
        .bind(vehicle.vehicle_type)
        .bind(vehicle.max_load_capacity)
        .bind(vehicle.odometer)
        .bind(&vehicle.region)
        .bind(vehicle.status)
        .bind(vehicle.last_maintenance_date)
        .bind(vehicle.last_trip_date)
        .bind(vehicle.acquisition_cost)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Vehicle"))?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE license_plate = $1")
                .bind(license_plate)
                .fetch_optional(&self.pool)
                .await?;

        Ok(vehicle)
    }

    async fn list(&self, filters: &VehicleFilters, pagination: Pagination) -> AppResult<Vec<Vehicle>> {
        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::vehicle_status IS NULL OR status = $1)
              AND ($2::vehicle_type IS NULL OR vehicle_type = $2)
              AND ($3::text IS NULL OR region = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(filters.status)
        .bind(filters.vehicle_type)
        .bind(filters.region.as_deref())
        .bind(pagination.limit as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<VehicleStatus>,
        patch: &VehiclePatch,
    ) -> AppResult<UpdateOutcome<Vehicle>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !guard.admits(&current.status) {
            return Ok(UpdateOutcome::Conflict(current));
        }

        patch.check_odometer(&current)?;

        let updated = patch.apply(&current, Utc::now());
        let saved = sqlx::query_as::<_, Vehicle>(
            r#"
            UPDATE vehicles
            SET license_plate = $2, model = $3, vehicle_type = $4, max_load_capacity = $5,
                odometer = $6, region = $7, status = $8, last_maintenance_date = $9,
                last_trip_date = $10, acquisition_cost = $11, updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&updated.license_plate)
        .bind(&updated.model)
        .bind(updated.vehicle_type)
        .bind(updated.max_load_capacity)
        .bind(updated.odometer)
        .bind(&updated.region)
        .bind(updated.status)
        .bind(updated.last_maintenance_date)
        .bind(updated.last_trip_date)
        .bind(updated.acquisition_cost)
        .bind(updated.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Vehicle"))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Error committing vehicle update: {}", e)))?;

        Ok(UpdateOutcome::Updated(saved))
    }
}
