//! Modelo de Driver
//!
//! Contiene el struct Driver, el cálculo del safety score y la regla de
//! suspensión por licencia vencida, que se aplica en cada escritura.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::vehicle::VehicleType;

/// Score máximo (y score inicial) de un conductor
pub const MAX_SAFETY_SCORE: f64 = 10.0;

/// Puntos restados por cada queja registrada
pub const COMPLAINT_PENALTY: f64 = 2.0;

/// Estado del conductor - mapea al ENUM driver_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "driver_status")]
pub enum DriverStatus {
    #[serde(rename = "On Duty")]
    #[sqlx(rename = "On Duty")]
    OnDuty,
    #[serde(rename = "Off Duty")]
    #[sqlx(rename = "Off Duty")]
    OffDuty,
    #[serde(rename = "On Trip")]
    #[sqlx(rename = "On Trip")]
    OnTrip,
    Suspended,
}

impl DriverStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverStatus::OnDuty => "On Duty",
            DriverStatus::OffDuty => "Off Duty",
            DriverStatus::OnTrip => "On Trip",
            DriverStatus::Suspended => "Suspended",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver principal - mapea exactamente a la tabla drivers
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Driver {
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

/// Datos necesarios para registrar un conductor
#[derive(Debug, Clone)]
pub struct NewDriver {
    pub name: String,
    pub license_number: String,
    pub license_expiry_date: DateTime<Utc>,
    pub license_category: VehicleType,
    pub status: Option<DriverStatus>,
}

impl Driver {
    pub fn register(new: NewDriver, now: DateTime<Utc>) -> Self {
        let driver = Self {
            id: Uuid::new_v4(),
            name: new.name,
            license_number: new.license_number.trim().to_string(),
            license_expiry_date: new.license_expiry_date,
            license_category: new.license_category,
            status: new.status.unwrap_or(DriverStatus::OnDuty),
            safety_score: MAX_SAFETY_SCORE,
            total_trips: 0,
            completed_trips: 0,
            complaints_count: 0,
            created_at: now,
            updated_at: now,
        };
        enforce_suspension_invariant(driver, now)
    }

    pub fn license_expired(&self, now: DateTime<Utc>) -> bool {
        self.license_expiry_date < now
    }
}

/// Fuerza `Suspended` si la licencia está vencida.
///
/// Tiene prioridad sobre cualquier estado explícito de la misma escritura.
pub fn enforce_suspension_invariant(mut driver: Driver, now: DateTime<Utc>) -> Driver {
    if driver.license_expired(now) {
        driver.status = DriverStatus::Suspended;
    }
    driver
}

/// Score determinista a partir de los contadores, siempre en [0, 10]
pub fn compute_safety_score(total_trips: i32, completed_trips: i32, complaints_count: i32) -> f64 {
    let completion_rate = if total_trips > 0 {
        (completed_trips as f64 / total_trips as f64) * MAX_SAFETY_SCORE
    } else {
        MAX_SAFETY_SCORE
    };
    let penalty = complaints_count as f64 * COMPLAINT_PENALTY;

    (completion_rate - penalty).clamp(0.0, MAX_SAFETY_SCORE)
}

/// Cambios parciales sobre un conductor.
///
/// Los contadores se expresan como deltas para que el store los aplique sobre
/// el registro bloqueado, nunca sobre una copia leída antes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverPatch {
    pub name: Option<String>,
    pub license_number: Option<String>,
    pub license_expiry_date: Option<DateTime<Utc>>,
    pub license_category: Option<VehicleType>,
    pub status: Option<DriverStatus>,
    pub total_trips_delta: i32,
    pub completed_trips_delta: i32,
    pub complaints_delta: i32,
    /// Recalcula el safety score con los contadores ya actualizados
    pub recompute_safety_score: bool,
}

impl DriverPatch {
    pub fn status(status: DriverStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, driver: &Driver, now: DateTime<Utc>) -> Driver {
        let mut updated = driver.clone();
        if let Some(name) = &self.name {
            updated.name = name.clone();
        }
        if let Some(number) = &self.license_number {
            updated.license_number = number.trim().to_string();
        }
        if let Some(expiry) = self.license_expiry_date {
            updated.license_expiry_date = expiry;
        }
        if let Some(category) = self.license_category {
            updated.license_category = category;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        updated.total_trips = (updated.total_trips + self.total_trips_delta).max(0);
        updated.completed_trips = (updated.completed_trips + self.completed_trips_delta).max(0);
        updated.complaints_count = (updated.complaints_count + self.complaints_delta).max(0);
        if self.recompute_safety_score {
            updated.safety_score = compute_safety_score(
                updated.total_trips,
                updated.completed_trips,
                updated.complaints_count,
            );
        }
        updated.updated_at = now;

        enforce_suspension_invariant(updated, now)
    }
}
