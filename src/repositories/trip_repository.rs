use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Pagination, StatusGuard, TripFilters, TripRepository, UpdateOutcome};
use crate::models::{Trip, TripPatch, TripStatus};
use crate::utils::errors::{map_write_error, AppError, AppResult};

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn create(&self, trip: &Trip) -> AppResult<Trip> {
        let created = sqlx::query_as::<_, Trip>(
            r#"
            INSERT INTO trips (
                id, vehicle_id, driver_id, cargo_weight, origin, destination, estimated_fuel_cost,
                actual_fuel_cost, revenue, status, start_time, end_time, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(trip.id)
        .bind(trip.vehicle_id)
        .bind(trip.driver_id)
        .bind(trip.cargo_weight)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(trip.estimated_fuel_cost)
        .bind(trip.actual_fuel_cost)
        .bind(trip.revenue)
        .bind(trip.status)
        .bind(trip.start_time)
        .bind(trip.end_time)
        .bind(trip.created_at)
        .bind(trip.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Trip"))?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>> {
        let trip = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trip)
    }

    async fn list(&self, filters: &TripFilters, pagination: Pagination) -> AppResult<Vec<Trip>> {
        let trips = sqlx::query_as::<_, Trip>(
            r#"
            SELECT * FROM trips
            WHERE ($1::trip_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filters.status)
        .bind(pagination.limit as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(trips)
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<TripStatus>,
        patch: &TripPatch,
    ) -> AppResult<UpdateOutcome<Trip>> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Trip>("SELECT * FROM trips WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(UpdateOutcome::NotFound);
        };
        if !guard.admits(&current.status) {
            return Ok(UpdateOutcome::Conflict(current));
        }

        let updated = patch.apply(&current, Utc::now());
        let saved = sqlx::query_as::<_, Trip>(
            r#"
            UPDATE trips
            SET status = $2, start_time = $3, end_time = $4, actual_fuel_cost = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(updated.status)
        .bind(updated.start_time)
        .bind(updated.end_time)
        .bind(updated.actual_fuel_cost)
        .bind(updated.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Error committing trip update: {}", e)))?;

        Ok(UpdateOutcome::Updated(saved))
    }
}
