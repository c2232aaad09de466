//! Modelo de Trip
//!
//! Un viaje referencia (sin poseer) un vehículo y un conductor. Su estado
//! sólo avanza: Draft → Dispatched → {Completed | Cancelled}.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Estado del viaje - mapea al ENUM trip_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "trip_status")]
pub enum TripStatus {
    Draft,
    Dispatched,
    Completed,
    Cancelled,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Draft => "Draft",
            TripStatus::Dispatched => "Dispatched",
            TripStatus::Completed => "Completed",
            TripStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TripStatus::Completed | TripStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: TripStatus) -> bool {
        matches!(
            (self, next),
            (TripStatus::Draft, TripStatus::Dispatched)
                | (TripStatus::Dispatched, TripStatus::Completed)
                | (TripStatus::Dispatched, TripStatus::Cancelled)
        )
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip principal - mapea exactamente a la tabla trips
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Trip {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    /// Peso de la carga en kg
    pub cargo_weight: f64,
    pub origin: String,
    pub destination: String,
    pub estimated_fuel_cost: Decimal,
    pub actual_fuel_cost: Option<Decimal>,
    pub revenue: Decimal,
    pub status: TripStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub cargo_weight: f64,
    pub origin: String,
    pub destination: String,
    pub estimated_fuel_cost: Decimal,
    pub revenue: Decimal,
}

impl Trip {
    pub fn draft(new: NewTrip, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: new.vehicle_id,
            driver_id: new.driver_id,
            cargo_weight: new.cargo_weight,
            origin: new.origin,
            destination: new.destination,
            estimated_fuel_cost: new.estimated_fuel_cost,
            actual_fuel_cost: None,
            revenue: new.revenue,
            status: TripStatus::Draft,
            start_time: None,
            end_time: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Cambios de un viaje; sólo el workflow los produce
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripPatch {
    pub status: Option<TripStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub actual_fuel_cost: Option<Decimal>,
}

impl TripPatch {
    pub fn apply(&self, trip: &Trip, now: DateTime<Utc>) -> Trip {
        let mut updated = trip.clone();
        if let Some(status) = self.status {
            updated.status = status;
        }
        if let Some(start) = self.start_time {
            updated.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            updated.end_time = Some(end);
        }
        if let Some(cost) = self.actual_fuel_cost {
            updated.actual_fuel_cost = Some(cost);
        }
        updated.updated_at = now;
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_forward_only() {
        use TripStatus::*;
        assert!(Draft.can_transition_to(Dispatched));
        assert!(Dispatched.can_transition_to(Completed));
        assert!(Dispatched.can_transition_to(Cancelled));

        assert!(!Draft.can_transition_to(Completed));
        assert!(!Draft.can_transition_to(Cancelled));
        assert!(!Dispatched.can_transition_to(Draft));
        assert!(!Dispatched.can_transition_to(Dispatched));
        for terminal in [Completed, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [Draft, Dispatched, Completed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }
}
