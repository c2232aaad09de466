//! Motor de workflow de viajes
//!
//! Cada transición (dispatch, complete, cancel) se divide en dos fases:
//!
//! 1. Un *plan* puro construido a partir de las instantáneas de Trip, Vehicle
//!    y Driver. Verifica las precondiciones en orden y describe tres escrituras
//!    condicionales, cada una con su guarda y su compensación.
//! 2. El *executor* aplica vehicle → driver → trip. Si una escritura falla,
//!    compensa las ya aplicadas en orden inverso. Si una compensación falla,
//!    devuelve `WorkflowInconsistency` para intervención del operador.
//!
//! El Trip se escribe siempre el último: su estado es el autoritativo.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::{
    Driver, DriverPatch, DriverStatus, Trip, TripPatch, TripStatus, Vehicle, VehiclePatch,
    VehicleStatus,
};
use crate::repositories::{Repositories, StatusGuard, UpdateOutcome};
use crate::utils::errors::{invalid_transition_error, not_found_error, AppError, AppResult};

/// Transiciones que avanzan un viaje más allá de Draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Dispatch,
    Complete,
    Cancel,
}

impl Transition {
    /// Participio usado en los mensajes ("dispatched", "completed", ...)
    pub fn action(&self) -> &'static str {
        match self {
            Transition::Dispatch => "dispatched",
            Transition::Complete => "completed",
            Transition::Cancel => "cancelled",
        }
    }

    /// Estado de origen requerido
    pub fn source(&self) -> TripStatus {
        match self {
            Transition::Dispatch => TripStatus::Draft,
            Transition::Complete | Transition::Cancel => TripStatus::Dispatched,
        }
    }

    pub fn target(&self) -> TripStatus {
        match self {
            Transition::Dispatch => TripStatus::Dispatched,
            Transition::Complete => TripStatus::Completed,
            Transition::Cancel => TripStatus::Cancelled,
        }
    }

    fn check_source(&self, trip: &Trip) -> AppResult<()> {
        if trip.status != self.source() || !trip.status.can_transition_to(self.target()) {
            return Err(invalid_transition_error(
                self.action(),
                self.source(),
                trip.status,
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Dispatch => f.write_str("dispatch"),
            Transition::Complete => f.write_str("complete"),
            Transition::Cancel => f.write_str("cancel"),
        }
    }
}

/// Una escritura condicional: guarda + patch
#[derive(Debug, Clone, PartialEq)]
pub struct GuardedWrite<S, P> {
    pub guard: StatusGuard<S>,
    pub patch: P,
}

/// Escritura sobre una entidad dependiente junto con su compensación
#[derive(Debug, Clone, PartialEq)]
pub struct SagaStep<S, P> {
    pub forward: GuardedWrite<S, P>,
    pub undo: GuardedWrite<S, P>,
}

/// Lote de escrituras que realiza una transición
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub transition: Transition,
    pub trip_id: Uuid,
    pub vehicle_id: Uuid,
    pub driver_id: Uuid,
    pub vehicle: SagaStep<VehicleStatus, VehiclePatch>,
    /// Escritura alternativa si el operador ya liberó el vehículo a mano
    /// (sólo complete y cancel)
    pub vehicle_fallback: Option<GuardedWrite<VehicleStatus, VehiclePatch>>,
    pub driver: SagaStep<DriverStatus, DriverPatch>,
    pub trip: GuardedWrite<TripStatus, TripPatch>,
}

/// Datos que aporta el cliente al completar un viaje
#[derive(Debug, Clone, Copy)]
pub struct CompletionInput {
    pub actual_fuel_cost: Decimal,
    pub final_odometer: f64,
}

/// Registros tal como quedan tras una transición exitosa
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub trip: Trip,
    pub vehicle: Vehicle,
    pub driver: Driver,
}

/// Draft → Dispatched. Precondiciones en orden, gana el primer fallo.
pub fn plan_dispatch(
    trip: &Trip,
    vehicle: &Vehicle,
    driver: &Driver,
    now: DateTime<Utc>,
) -> AppResult<TransitionPlan> {
    Transition::Dispatch.check_source(trip)?;

    if vehicle.status != VehicleStatus::Available {
        return Err(AppError::VehicleUnavailable {
            license_plate: vehicle.license_plate.clone(),
            status: vehicle.status,
        });
    }
    if driver.status != DriverStatus::OnDuty {
        return Err(AppError::DriverUnavailable {
            name: driver.name.clone(),
            status: driver.status,
        });
    }
    if driver.license_expired(now) {
        return Err(AppError::LicenseExpired {
            name: driver.name.clone(),
        });
    }
    if driver.license_category != vehicle.vehicle_type {
        return Err(AppError::LicenseCategoryMismatch {
            name: driver.name.clone(),
            license_category: driver.license_category,
            vehicle_type: vehicle.vehicle_type,
        });
    }

    Ok(TransitionPlan {
        transition: Transition::Dispatch,
        trip_id: trip.id,
        vehicle_id: vehicle.id,
        driver_id: driver.id,
        vehicle: SagaStep {
            forward: GuardedWrite {
                guard: StatusGuard::Is(VehicleStatus::Available),
                patch: VehiclePatch::status(VehicleStatus::OnTrip),
            },
            undo: GuardedWrite {
                guard: StatusGuard::Is(VehicleStatus::OnTrip),
                patch: VehiclePatch::status(vehicle.status),
            },
        },
        vehicle_fallback: None,
        driver: SagaStep {
            forward: GuardedWrite {
                guard: StatusGuard::Is(DriverStatus::OnDuty),
                patch: DriverPatch::status(DriverStatus::OnTrip),
            },
            undo: GuardedWrite {
                guard: StatusGuard::Is(DriverStatus::OnTrip),
                patch: DriverPatch::status(driver.status),
            },
        },
        trip: GuardedWrite {
            guard: StatusGuard::Is(TripStatus::Draft),
            patch: TripPatch {
                status: Some(TripStatus::Dispatched),
                start_time: Some(now),
                ..TripPatch::default()
            },
        },
    })
}

/// Dispatched → Completed
pub fn plan_complete(
    trip: &Trip,
    vehicle: &Vehicle,
    driver: &Driver,
    input: CompletionInput,
    now: DateTime<Utc>,
) -> AppResult<TransitionPlan> {
    Transition::Complete.check_source(trip)?;

    if !input.final_odometer.is_finite() || input.final_odometer < vehicle.odometer {
        return Err(AppError::OdometerRegression {
            final_odometer: input.final_odometer,
            current: vehicle.odometer,
        });
    }

    let vehicle_forward = VehiclePatch {
        status: Some(VehicleStatus::Available),
        odometer: Some(input.final_odometer),
        last_trip_date: Some(now),
        monotonic_odometer: true,
        ..VehiclePatch::default()
    };
    let trip_patch = TripPatch {
        status: Some(TripStatus::Completed),
        end_time: Some(now),
        actual_fuel_cost: Some(input.actual_fuel_cost),
        ..TripPatch::default()
    };

    Ok(release_plan(
        Transition::Complete,
        trip,
        vehicle,
        driver,
        vehicle_forward,
        1,
        trip_patch,
    ))
}

/// Dispatched → Cancelled. `end_time` queda sin fijar.
pub fn plan_cancel(
    trip: &Trip,
    vehicle: &Vehicle,
    driver: &Driver,
    _now: DateTime<Utc>,
) -> AppResult<TransitionPlan> {
    Transition::Cancel.check_source(trip)?;

    let trip_patch = TripPatch {
        status: Some(TripStatus::Cancelled),
        ..TripPatch::default()
    };

    Ok(release_plan(
        Transition::Cancel,
        trip,
        vehicle,
        driver,
        VehiclePatch::status(VehicleStatus::Available),
        0,
        trip_patch,
    ))
}

/// Complete y cancel liberan los mismos recursos; sólo cambian odómetro y
/// contadores. El vehículo se reclama con `Not(Available)` para que una
/// segunda liberación concurrente no pase. Si el vehículo ya está Available
/// con el viaje aún Dispatched, el executor usa `vehicle_fallback`, que no
/// toca el estado. El safety score se recalcula en la misma escritura del
/// conductor, después de aplicar los contadores.
fn release_plan(
    transition: Transition,
    trip: &Trip,
    vehicle: &Vehicle,
    driver: &Driver,
    vehicle_forward: VehiclePatch,
    completed_delta: i32,
    trip_patch: TripPatch,
) -> TransitionPlan {
    let vehicle_undo = VehiclePatch {
        status: Some(vehicle.status),
        odometer: vehicle_forward.odometer.map(|_| vehicle.odometer),
        last_trip_date: vehicle_forward.last_trip_date.map(|_| vehicle.last_trip_date),
        ..VehiclePatch::default()
    };
    let vehicle_fallback = VehiclePatch {
        odometer: vehicle_forward.odometer,
        last_trip_date: vehicle_forward.last_trip_date,
        monotonic_odometer: vehicle_forward.monotonic_odometer,
        ..VehiclePatch::default()
    };

    TransitionPlan {
        transition,
        trip_id: trip.id,
        vehicle_id: vehicle.id,
        driver_id: driver.id,
        vehicle: SagaStep {
            forward: GuardedWrite {
                guard: StatusGuard::Not(VehicleStatus::Available),
                patch: vehicle_forward,
            },
            undo: GuardedWrite {
                guard: StatusGuard::Is(VehicleStatus::Available),
                patch: vehicle_undo,
            },
        },
        vehicle_fallback: Some(GuardedWrite {
            guard: StatusGuard::Is(VehicleStatus::Available),
            patch: vehicle_fallback,
        }),
        driver: SagaStep {
            forward: GuardedWrite {
                guard: StatusGuard::Any,
                patch: DriverPatch {
                    status: Some(DriverStatus::OnDuty),
                    total_trips_delta: 1,
                    completed_trips_delta: completed_delta,
                    recompute_safety_score: true,
                    ..DriverPatch::default()
                },
            },
            undo: GuardedWrite {
                guard: StatusGuard::Any,
                patch: DriverPatch {
                    status: Some(driver.status),
                    total_trips_delta: -1,
                    completed_trips_delta: -completed_delta,
                    recompute_safety_score: true,
                    ..DriverPatch::default()
                },
            },
        },
        trip: GuardedWrite {
            guard: StatusGuard::Is(TripStatus::Dispatched),
            patch: trip_patch,
        },
    }
}

type VehicleWrite = GuardedWrite<VehicleStatus, VehiclePatch>;
type DriverWrite = GuardedWrite<DriverStatus, DriverPatch>;

/// Escritura ya aplicada, con la compensación que la deshace
#[derive(Debug, Clone)]
enum Applied {
    Vehicle(VehicleWrite),
    Driver(DriverWrite),
}

impl Applied {
    fn record(&self, plan: &TransitionPlan) -> String {
        match self {
            Applied::Vehicle(_) => format!("vehicle {}", plan.vehicle_id),
            Applied::Driver(_) => format!("driver {}", plan.driver_id),
        }
    }
}

/// Aplica un plan contra los repositorios con compensación en orden inverso
pub async fn execute_plan(
    repositories: &Repositories,
    plan: &TransitionPlan,
) -> AppResult<TransitionOutcome> {
    debug!(
        "🔄 Ejecutando {} del viaje {} (vehículo {}, conductor {})",
        plan.transition, plan.trip_id, plan.vehicle_id, plan.driver_id
    );

    let (vehicle, vehicle_undo) = apply_vehicle(repositories, plan).await?;

    let driver = match apply_driver(repositories, plan).await {
        Ok(driver) => driver,
        Err(err) => {
            let applied = [Applied::Vehicle(vehicle_undo)];
            return Err(compensate(repositories, plan, &applied, err).await);
        }
    };

    let trip = match apply_trip(repositories, plan).await {
        Ok(trip) => trip,
        Err(err) => {
            let applied = if lost_release_race(plan, &err) {
                // Otra liberación ya cerró el viaje y dejó vehículo y
                // conductor libres: sólo se revierten los contadores propios
                let mut undo = plan.driver.undo.clone();
                undo.patch.status = None;
                vec![Applied::Driver(undo)]
            } else {
                vec![
                    Applied::Driver(plan.driver.undo.clone()),
                    Applied::Vehicle(vehicle_undo),
                ]
            };
            return Err(compensate(repositories, plan, &applied, err).await);
        }
    };

    info!(
        "✅ Viaje {} {} (vehículo {}: {}, conductor {}: {})",
        trip.id,
        plan.transition.action(),
        vehicle.license_plate,
        vehicle.status,
        driver.name,
        driver.status
    );

    Ok(TransitionOutcome {
        trip,
        vehicle,
        driver,
    })
}

/// El viaje salió de Dispatched mientras se liberaban sus recursos
fn lost_release_race(plan: &TransitionPlan, err: &AppError) -> bool {
    plan.transition != Transition::Dispatch && matches!(err, AppError::InvalidTransition(_))
}

/// Escritura hacia delante sobre el vehículo. Un odómetro rechazado por el
/// store se informa como regresión del viaje.
async fn write_vehicle(
    repositories: &Repositories,
    plan: &TransitionPlan,
    write: &VehicleWrite,
) -> AppResult<UpdateOutcome<Vehicle>> {
    repositories
        .vehicles
        .update_conditional(plan.vehicle_id, write.guard, &write.patch)
        .await
        .map_err(|err| match err {
            AppError::InvalidOdometer { current, requested } => AppError::OdometerRegression {
                final_odometer: requested,
                current,
            },
            other => other,
        })
}

async fn apply_vehicle(
    repositories: &Repositories,
    plan: &TransitionPlan,
) -> AppResult<(Vehicle, VehicleWrite)> {
    match write_vehicle(repositories, plan, &plan.vehicle.forward).await? {
        UpdateOutcome::Updated(vehicle) => Ok((vehicle, plan.vehicle.undo.clone())),
        UpdateOutcome::Conflict(current) => match (plan.transition, &plan.vehicle_fallback) {
            (Transition::Dispatch, _) => Err(AppError::VehicleUnavailable {
                license_plate: current.license_plate,
                status: current.status,
            }),
            (_, Some(fallback)) => apply_vehicle_fallback(repositories, plan, fallback, current).await,
            (_, None) => Err(already_released(&current)),
        },
        UpdateOutcome::NotFound => Err(not_found_error("Vehicle", &plan.vehicle_id.to_string())),
    }
}

/// El vehículo ya está Available. Si el viaje sigue Dispatched fue una
/// liberación manual del operador: se aplican odómetro y fecha sin tocar el
/// estado. Si no, otra transición ya cerró el viaje.
async fn apply_vehicle_fallback(
    repositories: &Repositories,
    plan: &TransitionPlan,
    fallback: &VehicleWrite,
    current: Vehicle,
) -> AppResult<(Vehicle, VehicleWrite)> {
    let trip = repositories
        .trips
        .find_by_id(plan.trip_id)
        .await?
        .ok_or_else(|| not_found_error("Trip", &plan.trip_id.to_string()))?;
    if trip.status != plan.transition.source() {
        return Err(invalid_transition_error(
            plan.transition.action(),
            plan.transition.source(),
            trip.status,
        ));
    }

    warn!(
        "⚠️  Vehículo {} liberado manualmente con el viaje {} en curso",
        current.license_plate, plan.trip_id
    );
    let undo = GuardedWrite {
        guard: StatusGuard::Is(VehicleStatus::Available),
        patch: VehiclePatch {
            odometer: fallback.patch.odometer.map(|_| current.odometer),
            last_trip_date: fallback.patch.last_trip_date.map(|_| current.last_trip_date),
            ..VehiclePatch::default()
        },
    };

    match write_vehicle(repositories, plan, fallback).await? {
        UpdateOutcome::Updated(vehicle) => Ok((vehicle, undo)),
        UpdateOutcome::Conflict(changed) => Err(already_released(&changed)),
        UpdateOutcome::NotFound => Err(not_found_error("Vehicle", &plan.vehicle_id.to_string())),
    }
}

fn already_released(vehicle: &Vehicle) -> AppError {
    AppError::InvalidTransition(format!(
        "Vehicle {} was already released (Status: {})",
        vehicle.license_plate, vehicle.status
    ))
}

async fn apply_driver(repositories: &Repositories, plan: &TransitionPlan) -> AppResult<Driver> {
    let step = &plan.driver.forward;
    match repositories
        .drivers
        .update_conditional(plan.driver_id, step.guard, &step.patch)
        .await?
    {
        UpdateOutcome::Updated(driver) => Ok(driver),
        UpdateOutcome::Conflict(current) => Err(match plan.transition {
            Transition::Dispatch => AppError::DriverUnavailable {
                name: current.name,
                status: current.status,
            },
            Transition::Complete | Transition::Cancel => AppError::InvalidTransition(format!(
                "Driver {} cannot be released (Status: {})",
                current.name, current.status
            )),
        }),
        UpdateOutcome::NotFound => Err(not_found_error("Driver", &plan.driver_id.to_string())),
    }
}

async fn apply_trip(repositories: &Repositories, plan: &TransitionPlan) -> AppResult<Trip> {
    let step = &plan.trip;
    match repositories
        .trips
        .update_conditional(plan.trip_id, step.guard, &step.patch)
        .await?
    {
        UpdateOutcome::Updated(trip) => Ok(trip),
        UpdateOutcome::Conflict(current) => Err(invalid_transition_error(
            plan.transition.action(),
            plan.transition.source(),
            current.status,
        )),
        UpdateOutcome::NotFound => Err(not_found_error("Trip", &plan.trip_id.to_string())),
    }
}

/// Deshace las escrituras aplicadas. Devuelve el error original si todo se
/// revirtió, o `WorkflowInconsistency` si algún registro quedó aplicado.
async fn compensate(
    repositories: &Repositories,
    plan: &TransitionPlan,
    applied: &[Applied],
    cause: AppError,
) -> AppError {
    warn!(
        "↩️  {} del viaje {} falló ({}), compensando {} escrituras",
        plan.transition,
        plan.trip_id,
        cause,
        applied.len()
    );

    let mut left_applied = Vec::new();
    for step in applied {
        let reverted = match step {
            Applied::Vehicle(undo) => repositories
                .vehicles
                .update_conditional(plan.vehicle_id, undo.guard, &undo.patch)
                .await
                .map(|outcome| outcome.updated().is_some()),
            Applied::Driver(undo) => repositories
                .drivers
                .update_conditional(plan.driver_id, undo.guard, &undo.patch)
                .await
                .map(|outcome| outcome.updated().is_some()),
        };

        match reverted {
            Ok(true) => debug!("↩️  Compensación aplicada sobre {}", step.record(plan)),
            Ok(false) => {
                error!("❌ Compensación sobre {} rechazada por la guarda", step.record(plan));
                left_applied.push(step.record(plan));
            }
            Err(e) => {
                error!("❌ Compensación sobre {} falló: {}", step.record(plan), e);
                left_applied.push(step.record(plan));
            }
        }
    }

    if left_applied.is_empty() {
        return cause;
    }

    AppError::WorkflowInconsistency(format!(
        "{} of trip {} failed ({}) and could not be rolled back for {}",
        plan.transition,
        plan.trip_id,
        cause,
        left_applied.join(", ")
    ))
}
