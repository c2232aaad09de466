use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Driver, DriverPatch, DriverStatus, NewDriver, VehicleType};
use crate::repositories::{DriverFilters, Pagination};

// Request para registrar un conductor
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub license_number: String,
    #[serde(deserialize_with = "crate::utils::validation::deserialize_datetime")]
    pub license_expiry_date: DateTime<Utc>,
    pub license_category: VehicleType,
    pub status: Option<DriverStatus>,
}

impl From<CreateDriverRequest> for NewDriver {
    fn from(request: CreateDriverRequest) -> Self {
        Self {
            name: request.name,
            license_number: request.license_number,
            license_expiry_date: request.license_expiry_date,
            license_category: request.license_category,
            status: request.status,
        }
    }
}

/// Request de actualización. Score y contadores no se aceptan: los campos
/// desconocidos del body se ignoran.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub license_number: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::validation::deserialize_optional_datetime")]
    pub license_expiry_date: Option<DateTime<Utc>>,
    pub license_category: Option<VehicleType>,
    pub status: Option<DriverStatus>,
}

impl From<UpdateDriverRequest> for DriverPatch {
    fn from(request: UpdateDriverRequest) -> Self {
        Self {
            name: request.name,
            license_number: request.license_number,
            license_expiry_date: request.license_expiry_date,
            license_category: request.license_category,
            status: request.status,
            ..DriverPatch::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DriverListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<DriverStatus>,
}

impl DriverListQuery {
    pub fn into_parts(self) -> (DriverFilters, Pagination) {
        (
            DriverFilters {
                status: self.status,
            },
            Pagination::new(self.page, self.limit),
        )
    }
}

// Response de conductor
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverResponse {
    pub id: Uuid,
    pub name: String,
    pub license_number: String,
    pub license_expiry_date: DateTime<Utc>,
    pub license_category: VehicleType,
    pub status: DriverStatus,
    pub safety_score: f64,
    pub total_trips: i32,
    pub completed_trips: i32,
    pub complaints_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        Self {
            id: driver.id,
            name: driver.name,
            license_number: driver.license_number,
            license_expiry_date: driver.license_expiry_date,
            license_category: driver.license_category,
            status: driver.status,
            safety_score: driver.safety_score,
            total_trips: driver.total_trips,
            completed_trips: driver.completed_trips,
            complaints_count: driver.complaints_count,
            created_at: driver.created_at,
            updated_at: driver.updated_at,
        }
    }
}
