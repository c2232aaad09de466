use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DriverFilters, DriverRepository, Pagination, StatusGuard, UpdateOutcome};
use crate::models::{Driver, DriverPatch, DriverStatus};
use crate::utils::errors::{map_write_error, AppError, AppResult};

pub struct PgDriverRepository {
    pool: PgPool,
}

impl PgDriverRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DriverRepository for PgDriverRepository {
    async fn create(&self, driver: &Driver) -> AppResult<Driver> {
        let created = sqlx::query_as::<_, Driver>(
            r#"
            INSERT INTO drivers (
                id, name, license_number, license_expiry_date, license_category, status,
                safety_score, total_trips, completed_trips, complaints_count, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(driver.id)
        .bind(&driver.name)
        .bind(&driver.license_number)
        .bind(driver.license_expiry_date)
        .bind(driver.license_category)
        .bind(driver.status)
        .bind(driver.safety_score)
        .bind(driver.total_trips)
        .bind(driver.completed_trips)
        .bind(driver.complaints_count)
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Driver"))?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        let driver = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(driver)
    }

    async fn find_by_license_number(&self, license_number: &str) -> AppResult<Option<Driver>> {
        let driver =
            sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE license_number = $1")
                .bind(license_number)
                .fetch_optional(&self.pool)
                .await?;

        Ok(driver)
    }

    async fn list(&self, filters: &DriverFilters, pagination: Pagination) -> AppResult<Vec<Driver>> {
        let drivers = sqlx::query_as::<_, Driver>(
            r#"
            SELECT * FROM drivers
            WHERE ($1::driver_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filters.status)
        .bind(pagination.limit as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(drivers)
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<DriverStatus>,
        patch: &DriverPatch,
    ) -> AppResult<UpdateOutcome<Driver>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Driver>("SELECT * FROM drivers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !guard.admits(&current.status) {
            return Ok(UpdateOutcome::Conflict(current));
        }

        // Deltas, score y suspensión se resuelven sobre la fila bloqueada
        let updated = patch.apply(&current, Utc::now());
        let saved = sqlx::query_as::<_, Driver>(
            r#"
            UPDATE drivers
            SET name = $2, license_number = $3, license_expiry_date = $4, license_category = $5,
                status = $6, safety_score = $7, total_trips = $8, completed_trips = $9,
                complaints_count = $10, updated_at = $11
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&updated.name)
        .bind(&updated.license_number)
        .bind(updated.license_expiry_date)
        .bind(updated.license_category)
        .bind(updated.status)
        .bind(updated.safety_score)
        .bind(updated.total_trips)
        .bind(updated.completed_trips)
        .bind(updated.complaints_count)
        .bind(updated.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "Driver"))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Error committing driver update: {}", e)))?;

        Ok(UpdateOutcome::Updated(saved))
    }
}
