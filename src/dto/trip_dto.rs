use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Trip, TripStatus};
use crate::repositories::{Pagination, TripFilters};
use crate::services::{CompletionInput, CreateTripInput};

// Request para crear un viaje (Draft). El dashboard envía `vehicle`/`driver`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    #[serde(alias = "vehicle")]
    pub vehicle_id: Uuid,
    #[serde(alias = "driver")]
    pub driver_id: Uuid,
    pub cargo_weight: f64,
    #[validate(length(min = 1, max = 200))]
    pub origin: String,
    #[validate(length(min = 1, max = 200))]
    pub destination: String,
    pub estimated_fuel_cost: Decimal,
    pub revenue: Decimal,
}

impl From<CreateTripRequest> for CreateTripInput {
    fn from(request: CreateTripRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            driver_id: request.driver_id,
            cargo_weight: request.cargo_weight,
            origin: request.origin,
            destination: request.destination,
            estimated_fuel_cost: request.estimated_fuel_cost,
            revenue: request.revenue,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTripRequest {
    pub actual_fuel_cost: Decimal,
    pub final_odometer: f64,
}

impl From<CompleteTripRequest> for CompletionInput {
    fn from(request: CompleteTripRequest) -> Self {
        Self {
            actual_fuel_cost: request.actual_fuel_cost,
            final_odometer: request.final_odometer,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TripListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<TripStatus>,
}

impl TripListQuery {
    pub fn into_parts(self) -> (TripFilters, Pagination) {
        (
            TripFilters {
                status: self.status,
            },
            Pagination::new(self.page, self.limit),
        )
    }
}

// Response de viaje
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub cargo_weight: f64,
    pub origin: String,
    pub destination: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_fuel_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub actual_fuel_cost: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue: Decimal,
    pub status: TripStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Trip> for TripResponse {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            vehicle_id: trip.vehicle_id,
            driver_id: trip.driver_id,
            cargo_weight: trip.cargo_weight,
            origin: trip.origin,
            destination: trip.destination,
            estimated_fuel_cost: trip.estimated_fuel_cost,
            actual_fuel_cost: trip.actual_fuel_cost,
            revenue: trip.revenue,
            status: trip.status,
            start_time: trip.start_time,
            end_time: trip.end_time,
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_reference_aliases() {
        let vehicle = Uuid::new_v4();
        let driver = Uuid::new_v4();
        let request: CreateTripRequest = serde_json::from_value(serde_json::json!({
            "vehicle": vehicle,
            "driver": driver,
            "cargoWeight": 1200.5,
            "origin": "Lyon",
            "destination": "Paris",
            "estimatedFuelCost": 150,
            "revenue": "900.50"
        }))
        .unwrap();
        assert_eq!(request.vehicle_id, vehicle);
        assert_eq!(request.driver_id, driver);
        assert_eq!(request.revenue, Decimal::new(90050, 2));
    }
}
