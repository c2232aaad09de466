//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, sus enums de tipo/estado y el
//! patch que aplican todos los caminos de escritura.
//! Mapea exactamente a la tabla `vehicles` del schema PostgreSQL.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use crate::utils::errors::{AppError, AppResult};

/// Tipo de vehículo - mapea al ENUM vehicle_type.
///
/// Es también el dominio de la categoría de licencia de un conductor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_type")]
pub enum VehicleType {
    Truck,
    Van,
    Bike,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Truck => "Truck",
            VehicleType::Van => "Van",
            VehicleType::Bike => "Bike",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status")]
pub enum VehicleStatus {
    Available,
    #[serde(rename = "On Trip")]
    #[sqlx(rename = "On Trip")]
    OnTrip,
    #[serde(rename = "In Shop")]
    #[sqlx(rename = "In Shop")]
    InShop,
    Retired,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "Available",
            VehicleStatus::OnTrip => "On Trip",
            VehicleStatus::InShop => "In Shop",
            VehicleStatus::Retired => "Retired",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle principal - mapea exactamente a la tabla vehicles
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    /// Capacidad máxima de carga en kg
    pub max_load_capacity: f64,
    /// Kilometraje actual, nunca decrece
    pub odometer: f64,
    pub region: String,
    pub status: VehicleStatus,
    pub last_maintenance_date: Option<DateTime<Utc>>,
    pub last_trip_date: DateTime<Utc>,
    pub acquisition_cost: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Datos necesarios para registrar un vehículo
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub license_plate: String,
    pub model: String,
    pub vehicle_type: VehicleType,
    pub max_load_capacity: f64,
    pub odometer: f64,
    pub region: String,
    pub last_maintenance_date: Option<DateTime<Utc>>,
    pub acquisition_cost: Decimal,
}

impl Vehicle {
    /// Construye un vehículo recién registrado (siempre Available)
    pub fn register(new: NewVehicle, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            license_plate: normalize_license_plate(&new.license_plate),
            model: new.model,
            vehicle_type: new.vehicle_type,
            max_load_capacity: new.max_load_capacity,
            odometer: new.odometer,
            region: new.region,
            status: VehicleStatus::Available,
            last_maintenance_date: new.last_maintenance_date,
            last_trip_date: now,
            acquisition_cost: new.acquisition_cost,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Las matrículas se guardan sin espacios en los extremos y en mayúsculas
pub fn normalize_license_plate(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Cambios parciales sobre un vehículo.
///
/// Los stores aplican el patch con [`VehiclePatch::apply`] sobre el registro
/// bloqueado, después de [`VehiclePatch::check_odometer`]. Las escrituras
/// hacia delante marcan `monotonic_odometer`; las compensaciones no, porque
/// restauran la lectura previa.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePatch {
    pub license_plate: Option<String>,
    pub model: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub max_load_capacity: Option<f64>,
    pub odometer: Option<f64>,
    pub region: Option<String>,
    pub status: Option<VehicleStatus>,
    pub last_maintenance_date: Option<DateTime<Utc>>,
    pub last_trip_date: Option<DateTime<Utc>>,
    pub acquisition_cost: Option<Decimal>,
    /// Rechaza el patch si `odometer` es menor que el del registro bloqueado
    pub monotonic_odometer: bool,
}

impl VehiclePatch {
    pub fn status(status: VehicleStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        Self {
            monotonic_odometer: false,
            ..self.clone()
        } == Self::default()
    }

    /// Falla con `InvalidOdometer` si el patch bajaría el odómetro de `current`
    pub fn check_odometer(&self, current: &Vehicle) -> AppResult<()> {
        match self.odometer {
            Some(requested) if self.monotonic_odometer && requested < current.odometer => {
                Err(AppError::InvalidOdometer {
                    current: current.odometer,
                    requested,
                })
            }
            _ => Ok(()),
        }
    }

    pub fn apply(&self, vehicle: &Vehicle, now: DateTime<Utc>) -> Vehicle {
        let mut updated = vehicle.clone();
        if let Some(plate) = &self.license_plate {
            updated.license_plate = normalize_license_plate(plate);
        }
        if let Some(model) = &self.model {
            updated.model = model.clone();
        }
        if let Some(vehicle_type) = self.vehicle_type {
            updated.vehicle_type = vehicle_type;
        }
        if let Some(capacity) = self.max_load_capacity {
            updated.max_load_capacity = capacity;
        }
        if let Some(odometer) = self.odometer {
            updated.odometer = odometer;
        }
        if let Some(region) = &self.region {
            updated.region = region.clone();
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        if let Some(date) = self.last_maintenance_date {
            updated.last_maintenance_date = Some(date);
        }
        if let Some(date) = self.last_trip_date {
            updated.last_trip_date = date;
        }
        if let Some(cost) = self.acquisition_cost {
            updated.acquisition_cost = cost;
        }
        updated.updated_at = now;
        updated
    }
}
