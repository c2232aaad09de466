use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{NewVehicle, Vehicle, VehiclePatch, VehicleStatus, VehicleType};
use crate::repositories::{Pagination, VehicleFilters};

// Request para registrar un vehículo
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVehicleRequest {
    #[validate(length(min = 2, max = 20))]
    pub license_plate: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub max_load_capacity: f64,
    #[serde(default)]
    pub odometer: f64,
    #[validate(length(min = 1, max = 100))]
    pub region: String,
    #[serde(default, deserialize_with = "crate::utils::validation::deserialize_optional_datetime")]
    pub last_maintenance_date: Option<DateTime<Utc>>,
    pub acquisition_cost: Option<Decimal>,
}

impl From<CreateVehicleRequest> for NewVehicle {
    fn from(request: CreateVehicleRequest) -> Self {
        Self {
            license_plate: request.license_plate,
            model: request.model,
            vehicle_type: request.vehicle_type,
            max_load_capacity: request.max_load_capacity,
            odometer: request.odometer,
            region: request.region,
            last_maintenance_date: request.last_maintenance_date,
            acquisition_cost: request.acquisition_cost.unwrap_or(Decimal::ZERO),
        }
    }
}

// Request para actualizar un vehículo; `status` es el override manual
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 2, max = 20))]
    pub license_plate: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,
    pub max_load_capacity: Option<f64>,
    pub odometer: Option<f64>,
    #[validate(length(min = 1, max = 100))]
    pub region: Option<String>,
    pub status: Option<VehicleStatus>,
    #[serde(default, deserialize_with = "crate::utils::validation::deserialize_optional_datetime")]
    pub last_maintenance_date: Option<DateTime<Utc>>,
    pub acquisition_cost: Option<Decimal>,
}

impl From<UpdateVehicleRequest> for VehiclePatch {
    fn from(request: UpdateVehicleRequest) -> Self {
        Self {
            license_plate: request.license_plate,
            model: request.model,
            vehicle_type: request.vehicle_type,
            max_load_capacity: request.max_load_capacity,
            odometer: request.odometer,
            region: request.region,
            status: request.status,
            last_maintenance_date: request.last_maintenance_date,
            acquisition_cost: request.acquisition_cost,
            ..VehiclePatch::default()
        }
    }
}

// Query de listado: ?page=1&limit=10&status=Available&type=Truck&region=North
#[derive(Debug, Default, Deserialize)]
pub struct VehicleListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<VehicleStatus>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<VehicleType>,
    pub region: Option<String>,
}

impl VehicleListQuery {
    pub fn into_parts(self) -> (VehicleFilters, Pagination) {
        (
            VehicleFilters {
                status: self.status,
                vehicle_type: self.vehicle_type,
                region: self.region.filter(|r| !r.trim().is_empty()),
            },
            Pagination::new(self.page, self.limit),
        )
    }
}

// Response de vehículo
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleResponse {
    pub id: Uuid,
    pub license_plate: String,
    pub model: String,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    pub max_load_capacity: f64,
    pub odometer: f64,
    pub region: String,
    pub status: VehicleStatus,
    pub last_maintenance_date: Option<DateTime<Utc>>,
    pub last_trip_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    pub acquisition_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: vehicle.id,
            license_plate: vehicle.license_plate,
            model: vehicle.model,
            vehicle_type: vehicle.vehicle_type,
            max_load_capacity: vehicle.max_load_capacity,
            odometer: vehicle.odometer,
            region: vehicle.region,
            status: vehicle.status,
            last_maintenance_date: vehicle.last_maintenance_date,
            last_trip_date: vehicle.last_trip_date,
            acquisition_cost: vehicle.acquisition_cost,
            created_at: vehicle.created_at,
            updated_at: vehicle.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_dashboard_payload() {
        let request: CreateVehicleRequest = serde_json::from_value(serde_json::json!({
            "licensePlate": "ab-123-cd",
            "model": "Actros",
            "type": "Truck",
            "maxLoadCapacity": 5000,
            "region": "North",
            "lastMaintenanceDate": "2026-01-15"
        }))
        .unwrap();
        assert!(request.validate().is_ok());

        let new: NewVehicle = request.into();
        assert_eq!(new.odometer, 0.0);
        assert_eq!(new.acquisition_cost, Decimal::ZERO);
        assert!(new.last_maintenance_date.is_some());
    }

    #[test]
    fn test_list_query_blank_region_is_ignored() {
        let query = VehicleListQuery {
            region: Some("  ".to_string()),
            ..VehicleListQuery::default()
        };
        let (filters, pagination) = query.into_parts();
        assert!(filters.region.is_none());
        assert_eq!(pagination, Pagination::default());
    }
}
