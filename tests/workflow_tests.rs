use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use fleet_ops::models::{
    Driver, DriverPatch, DriverStatus, ExpenseType, NewDriver, NewExpense, NewVehicle, Trip,
    TripPatch, TripStatus, Vehicle, VehiclePatch, VehicleStatus, VehicleType,
};
use fleet_ops::repositories::{
    DriverFilters, DriverRepository, ExpenseFilters, MemoryStore, Pagination, Repositories,
    StatusGuard, TripFilters, TripRepository, UpdateOutcome, VehicleFilters, VehicleRepository,
};
use fleet_ops::services::workflow::{execute_plan, plan_dispatch};
use fleet_ops::services::{
    CompletionInput, CreateTripInput, DriverService, ExpenseService, TripService, VehicleService,
};
use fleet_ops::utils::errors::{AppError, AppResult};

struct Fleet {
    repositories: Repositories,
    vehicles: VehicleService,
    drivers: DriverService,
    trips: TripService,
    expenses: ExpenseService,
}

impl Fleet {
    fn new(repositories: Repositories) -> Self {
        Self {
            vehicles: VehicleService::new(repositories.clone()),
            drivers: DriverService::new(repositories.clone()),
            trips: TripService::new(repositories.clone()),
            expenses: ExpenseService::new(repositories.clone()),
            repositories,
        }
    }

    fn in_memory() -> Self {
        Self::new(Repositories::in_memory())
    }

    async fn truck(&self, plate: &str, capacity: f64, odometer: f64) -> Vehicle {
        self.vehicles
            .register(NewVehicle {
                license_plate: plate.to_string(),
                model: "Volvo FH".to_string(),
                vehicle_type: VehicleType::Truck,
                max_load_capacity: capacity,
                odometer,
                region: "North".to_string(),
                last_maintenance_date: None,
                acquisition_cost: Decimal::new(85_000, 0),
            })
            .await
            .unwrap()
    }

    async fn driver(&self, license: &str, category: VehicleType) -> Uuid {
        self.drivers
            .register(NewDriver {
                name: format!("Driver {}", license),
                license_number: license.to_string(),
                license_expiry_date: Utc::now() + Duration::days(365),
                license_category: category,
                status: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn draft(&self, vehicle_id: Uuid, driver_id: Uuid, cargo_weight: f64) -> AppResult<Uuid> {
        self.trips
            .create(CreateTripInput {
                vehicle_id,
                driver_id,
                cargo_weight,
                origin: "Depot".to_string(),
                destination: "Port".to_string(),
                estimated_fuel_cost: Decimal::new(100, 0),
                revenue: Decimal::new(1_500, 0),
            })
            .await
            .map(|trip| trip.id)
    }
}

fn completion(final_odometer: f64) -> CompletionInput {
    CompletionInput {
        actual_fuel_cost: Decimal::new(80, 0),
        final_odometer,
    }
}

#[tokio::test]
async fn test_dispatch_then_complete_updates_all_three_records() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-100", 5000.0, 1000.0).await;
    let driver_id = fleet.driver("DL-100", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 2000.0).await.unwrap();

    let dispatched = fleet.trips.dispatch(trip_id).await.unwrap();
    assert_eq!(dispatched.trip.status, TripStatus::Dispatched);
    assert!(dispatched.trip.start_time.is_some());
    assert_eq!(dispatched.vehicle.status, VehicleStatus::OnTrip);
    assert_eq!(dispatched.driver.status, DriverStatus::OnTrip);

    let completed = fleet.trips.complete(trip_id, completion(1200.0)).await.unwrap();
    assert_eq!(completed.trip.status, TripStatus::Completed);
    assert!(completed.trip.end_time.is_some());
    assert_eq!(completed.trip.actual_fuel_cost, Some(Decimal::new(80, 0)));

    let vehicle = fleet.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.odometer, 1200.0);
    assert_eq!(vehicle.status, VehicleStatus::Available);

    let driver = fleet.drivers.get(driver_id).await.unwrap();
    assert_eq!(driver.status, DriverStatus::OnDuty);
    assert_eq!(driver.total_trips, 1);
    assert_eq!(driver.completed_trips, 1);
    assert_eq!(driver.safety_score, 10.0);
}

#[tokio::test]
async fn test_cancel_counts_against_completion_rate() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-200", 5000.0, 1000.0).await;
    let driver_id = fleet.driver("DL-200", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 2000.0).await.unwrap();

    fleet.trips.dispatch(trip_id).await.unwrap();
    let cancelled = fleet.trips.cancel(trip_id).await.unwrap();

    assert_eq!(cancelled.trip.status, TripStatus::Cancelled);
    assert!(cancelled.trip.end_time.is_none());
    assert_eq!(cancelled.vehicle.status, VehicleStatus::Available);
    assert_eq!(cancelled.vehicle.odometer, 1000.0);
    assert_eq!(cancelled.driver.status, DriverStatus::OnDuty);
    assert_eq!(cancelled.driver.total_trips, 1);
    assert_eq!(cancelled.driver.completed_trips, 0);
    assert_eq!(cancelled.driver.safety_score, 0.0);
}

#[tokio::test]
async fn test_draft_trip_cannot_be_cancelled() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-210", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-210", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();

    let err = fleet.trips.cancel(trip_id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_dispatch_twice_fails_the_second_time() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-300", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-300", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();

    assert!(fleet.trips.dispatch(trip_id).await.is_ok());
    let err = fleet.trips.dispatch(trip_id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

#[tokio::test]
async fn test_complete_twice_fails_the_second_time() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-310", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-310", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();

    fleet.trips.dispatch(trip_id).await.unwrap();
    fleet.trips.complete(trip_id, completion(50.0)).await.unwrap();
    let err = fleet.trips.complete(trip_id, completion(60.0)).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let driver = fleet.drivers.get(driver_id).await.unwrap();
    assert_eq!(driver.total_trips, 1);
}

#[tokio::test]
async fn test_capacity_is_checked_at_creation() {
    let fleet = Fleet::in_memory();
    let small = fleet.truck("TRK-400", 3000.0, 0.0).await;
    let large = fleet.truck("TRK-401", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-400", VehicleType::Truck).await;

    let err = fleet.draft(small.id, driver_id, 4000.0).await.unwrap_err();
    match err {
        AppError::CapacityExceeded {
            cargo_weight,
            max_load_capacity,
        } => {
            assert_eq!(cargo_weight, 4000.0);
            assert_eq!(max_load_capacity, 3000.0);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other),
    }

    let trip_id = fleet.draft(large.id, driver_id, 4000.0).await.unwrap();
    let trip = fleet.trips.get(trip_id).await.unwrap();
    assert_eq!(trip.status, TripStatus::Draft);

    // Crear un viaje no toca ni vehículo ni conductor
    let vehicle = fleet.vehicles.get(large.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_create_trip_with_unknown_references() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-410", 3000.0, 0.0).await;
    let driver_id = fleet.driver("DL-410", VehicleType::Truck).await;

    let err = fleet.draft(Uuid::new_v4(), driver_id, 10.0).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    let err = fleet.draft(vehicle.id, Uuid::new_v4(), 10.0).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_license_mismatch_mutates_nothing() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-500", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-500", VehicleType::Van).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();

    let err = fleet.trips.dispatch(trip_id).await.unwrap_err();
    assert!(matches!(err, AppError::LicenseCategoryMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "Driver Driver DL-500 is licensed for Van, but vehicle is a Truck"
    );

    assert_eq!(fleet.trips.get(trip_id).await.unwrap().status, TripStatus::Draft);
    assert_eq!(
        fleet.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::Available
    );
    assert_eq!(
        fleet.drivers.get(driver_id).await.unwrap().status,
        DriverStatus::OnDuty
    );
}

#[tokio::test]
async fn test_odometer_regression_on_complete_mutates_nothing() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-600", 5000.0, 1000.0).await;
    let driver_id = fleet.driver("DL-600", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();
    fleet.trips.dispatch(trip_id).await.unwrap();

    let err = fleet.trips.complete(trip_id, completion(999.0)).await.unwrap_err();
    assert!(matches!(err, AppError::OdometerRegression { .. }));

    assert_eq!(fleet.trips.get(trip_id).await.unwrap().status, TripStatus::Dispatched);
    let vehicle = fleet.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::OnTrip);
    assert_eq!(vehicle.odometer, 1000.0);
}

#[tokio::test]
async fn test_vehicle_odometer_never_decreases_on_update() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-700", 5000.0, 1000.0).await;

    for requested in [0.0, 500.0, 999.99] {
        let err = fleet
            .vehicles
            .update_fields(
                vehicle.id,
                VehiclePatch {
                    odometer: Some(requested),
                    ..VehiclePatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidOdometer { .. }));
    }

    let mut current = 1000.0;
    for requested in [1000.0, 1000.5, 25_000.0] {
        let updated = fleet
            .vehicles
            .update_fields(
                vehicle.id,
                VehiclePatch {
                    odometer: Some(requested),
                    ..VehiclePatch::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.odometer >= current);
        current = updated.odometer;
    }
}

#[tokio::test]
async fn test_vehicle_update_unknown_id() {
    let fleet = Fleet::in_memory();
    let err = fleet
        .vehicles
        .update_fields(Uuid::new_v4(), VehiclePatch::status(VehicleStatus::Retired))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_duplicate_plate_is_case_insensitive() {
    let fleet = Fleet::in_memory();
    fleet.truck("ab-900-cd", 1000.0, 0.0).await;

    let err = fleet
        .vehicles
        .register(NewVehicle {
            license_plate: " AB-900-CD ".to_string(),
            model: "Other".to_string(),
            vehicle_type: VehicleType::Van,
            max_load_capacity: 800.0,
            odometer: 0.0,
            region: "South".to_string(),
            last_maintenance_date: None,
            acquisition_cost: Decimal::ZERO,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(_)));
}

#[tokio::test]
async fn test_duplicate_license_number() {
    let fleet = Fleet::in_memory();
    fleet.driver("DL-DUP", VehicleType::Van).await;
    let err = fleet
        .drivers
        .register(NewDriver {
            name: "Someone".to_string(),
            license_number: "DL-DUP".to_string(),
            license_expiry_date: Utc::now() + Duration::days(10),
            license_category: VehicleType::Van,
            status: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicateKey(_)));
}

#[tokio::test]
async fn test_maintenance_expense_sends_vehicle_to_shop_from_any_status() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-800", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-800", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();
    fleet.trips.dispatch(trip_id).await.unwrap();

    let date = Utc::now() - Duration::days(1);
    let expense = fleet
        .expenses
        .log(NewExpense {
            vehicle_id: vehicle.id,
            expense_type: ExpenseType::Maintenance,
            amount: Decimal::new(45_000, 2),
            liters: None,
            description: Some("Brake pads".to_string()),
            date: Some(date),
        })
        .await
        .unwrap();
    assert_eq!(expense.date, date);

    let vehicle = fleet.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::InShop);
    assert_eq!(vehicle.last_maintenance_date, Some(date));
}

#[tokio::test]
async fn test_fuel_expense_leaves_vehicle_untouched() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-810", 5000.0, 0.0).await;

    fleet
        .expenses
        .log(NewExpense {
            vehicle_id: vehicle.id,
            expense_type: ExpenseType::Fuel,
            amount: Decimal::new(120, 0),
            liters: Some(80.0),
            description: None,
            date: None,
        })
        .await
        .unwrap();

    let vehicle = fleet.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
}

#[tokio::test]
async fn test_expense_persists_when_side_effect_fails() {
    let fleet = Fleet::in_memory();
    let unknown_vehicle = Uuid::new_v4();

    let expense = fleet
        .expenses
        .log(NewExpense {
            vehicle_id: unknown_vehicle,
            expense_type: ExpenseType::Maintenance,
            amount: Decimal::new(300, 0),
            liters: None,
            description: None,
            date: None,
        })
        .await
        .unwrap();

    let listed = fleet
        .expenses
        .list(&ExpenseFilters {
            vehicle_id: Some(unknown_vehicle),
            expense_type: None,
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, expense.id);
}

#[tokio::test]
async fn test_complaints_lower_score_and_clamp_at_zero() {
    let fleet = Fleet::in_memory();
    let driver_id = fleet.driver("DL-900", VehicleType::Bike).await;

    let driver = fleet.drivers.report_complaint(driver_id).await.unwrap();
    assert_eq!(driver.complaints_count, 1);
    assert_eq!(driver.safety_score, 8.0);

    for _ in 0..10 {
        fleet.drivers.report_complaint(driver_id).await.unwrap();
    }
    let driver = fleet.drivers.recompute_safety_score(driver_id).await.unwrap();
    assert_eq!(driver.complaints_count, 11);
    assert_eq!(driver.safety_score, 0.0);

    let err = fleet.drivers.report_complaint(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_expired_license_forces_suspension_on_every_write() {
    let fleet = Fleet::in_memory();
    let driver = fleet
        .drivers
        .register(NewDriver {
            name: "Old Licence".to_string(),
            license_number: "DL-EXP".to_string(),
            license_expiry_date: Utc::now() - Duration::days(3),
            license_category: VehicleType::Van,
            status: Some(DriverStatus::OnDuty),
        })
        .await
        .unwrap();
    assert_eq!(driver.status, DriverStatus::Suspended);

    let updated = fleet
        .drivers
        .update(
            driver.id,
            fleet_ops::models::DriverPatch::status(DriverStatus::OnDuty),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, DriverStatus::Suspended);
}

#[tokio::test]
async fn test_failed_driver_claim_rolls_back_vehicle() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-1000", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-1000", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();

    // Instantánea leída antes de que el conductor salga de servicio
    let trip = fleet.trips.get(trip_id).await.unwrap();
    let stale_driver = fleet.drivers.get(driver_id).await.unwrap();
    let vehicle = fleet.vehicles.get(vehicle.id).await.unwrap();
    let plan = plan_dispatch(&trip, &vehicle, &stale_driver, Utc::now()).unwrap();

    fleet
        .drivers
        .update(
            driver_id,
            fleet_ops::models::DriverPatch::status(DriverStatus::OffDuty),
        )
        .await
        .unwrap();

    let err = execute_plan(&fleet.repositories, &plan).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::DriverUnavailable {
            status: DriverStatus::OffDuty,
            ..
        }
    ));

    assert_eq!(
        fleet.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::Available
    );
    assert_eq!(fleet.trips.get(trip_id).await.unwrap().status, TripStatus::Draft);
}

#[tokio::test]
async fn test_concurrent_dispatch_claims_vehicle_once() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-1100", 5000.0, 0.0).await;
    let first_driver = fleet.driver("DL-1101", VehicleType::Truck).await;
    let second_driver = fleet.driver("DL-1102", VehicleType::Truck).await;
    let first_trip = fleet.draft(vehicle.id, first_driver, 100.0).await.unwrap();
    let second_trip = fleet.draft(vehicle.id, second_driver, 100.0).await.unwrap();

    let (a, b) = tokio::join!(
        fleet.trips.dispatch(first_trip),
        fleet.trips.dispatch(second_trip)
    );
    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::VehicleUnavailable { .. }))));

    let dispatched = fleet
        .repositories
        .trips
        .list(&Default::default(), Pagination::default())
        .await
        .unwrap()
        .into_iter()
        .filter(|t| t.status == TripStatus::Dispatched)
        .count();
    assert_eq!(dispatched, 1);
}

#[tokio::test]
async fn test_list_filters_and_paginates_vehicles() {
    let fleet = Fleet::in_memory();
    for i in 0..12 {
        fleet.truck(&format!("TRK-L{:02}", i), 1000.0, 0.0).await;
    }
    let retired = fleet.truck("TRK-RET", 1000.0, 0.0).await;
    fleet
        .vehicles
        .update_fields(retired.id, VehiclePatch::status(VehicleStatus::Retired))
        .await
        .unwrap();

    let first_page = fleet
        .vehicles
        .list(&VehicleFilters::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(first_page.len(), 10);

    let retired_only = fleet
        .vehicles
        .list(
            &VehicleFilters {
                status: Some(VehicleStatus::Retired),
                ..VehicleFilters::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(retired_only.len(), 1);
    assert_eq!(retired_only[0].license_plate, "TRK-RET");
}

/// Store de vehículos que deja pasar la primera escritura y falla las demás
struct FailAfterFirstWrite {
    inner: Arc<MemoryStore>,
    writes: AtomicUsize,
}

#[async_trait]
impl VehicleRepository for FailAfterFirstWrite {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        VehicleRepository::create(self.inner.as_ref(), vehicle).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        VehicleRepository::find_by_id(self.inner.as_ref(), id).await
    }

    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        self.inner.find_by_license_plate(license_plate).await
    }

    async fn list(&self, filters: &VehicleFilters, pagination: Pagination) -> AppResult<Vec<Vehicle>> {
        VehicleRepository::list(self.inner.as_ref(), filters, pagination).await
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<VehicleStatus>,
        patch: &VehiclePatch,
    ) -> AppResult<UpdateOutcome<Vehicle>> {
        if self.writes.fetch_add(1, Ordering::SeqCst) > 0 {
            return Err(AppError::Internal("store unavailable".to_string()));
        }
        VehicleRepository::update_conditional(self.inner.as_ref(), id, guard, patch).await
    }
}

#[tokio::test]
async fn test_failed_compensation_surfaces_workflow_inconsistency() {
    let store = Arc::new(MemoryStore::new());
    let flaky = Arc::new(FailAfterFirstWrite {
        inner: store.clone(),
        writes: AtomicUsize::new(0),
    });
    let repositories = Repositories {
        vehicles: flaky,
        drivers: store.clone(),
        trips: store.clone(),
        expenses: store.clone(),
    };
    let fleet = Fleet::new(repositories);

    // El registro no pasa por update_conditional
    let vehicle = fleet.truck("TRK-1200", 5000.0, 0.0).await;
    let driver_id = fleet.driver("DL-1200", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();

    let trip = fleet.trips.get(trip_id).await.unwrap();
    let stale_driver = fleet.drivers.get(driver_id).await.unwrap();
    let plan = plan_dispatch(&trip, &vehicle, &stale_driver, Utc::now()).unwrap();
    fleet
        .drivers
        .update(
            driver_id,
            fleet_ops::models::DriverPatch::status(DriverStatus::OffDuty),
        )
        .await
        .unwrap();

    let err = execute_plan(&fleet.repositories, &plan).await.unwrap_err();
    match &err {
        AppError::WorkflowInconsistency(message) => {
            assert!(message.contains(&vehicle.id.to_string()));
        }
        other => panic!("expected WorkflowInconsistency, got {:?}", other),
    }
    assert_eq!(err.code(), "WORKFLOW_INCONSISTENCY");

    // El viaje nunca se escribe si una dependencia falló
    assert_eq!(fleet.trips.get(trip_id).await.unwrap().status, TripStatus::Draft);
}

#[tokio::test]
async fn test_complete_after_manual_vehicle_release() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-1300", 5000.0, 1000.0).await;
    let driver_id = fleet.driver("DL-1300", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();
    fleet.trips.dispatch(trip_id).await.unwrap();

    // El operador devuelve el vehículo a Available con el viaje en curso
    fleet
        .vehicles
        .update_fields(vehicle.id, VehiclePatch::status(VehicleStatus::Available))
        .await
        .unwrap();

    let completed = fleet.trips.complete(trip_id, completion(1200.0)).await.unwrap();
    assert_eq!(completed.trip.status, TripStatus::Completed);
    assert_eq!(completed.vehicle.status, VehicleStatus::Available);
    assert_eq!(completed.vehicle.odometer, 1200.0);
    assert_eq!(completed.driver.status, DriverStatus::OnDuty);
    assert_eq!(completed.driver.total_trips, 1);
    assert_eq!(completed.driver.completed_trips, 1);

    let err = fleet.trips.complete(trip_id, completion(1300.0)).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().odometer, 1200.0);
}

#[tokio::test]
async fn test_cancel_after_manual_vehicle_release() {
    let fleet = Fleet::in_memory();
    let vehicle = fleet.truck("TRK-1310", 5000.0, 1000.0).await;
    let driver_id = fleet.driver("DL-1310", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();
    fleet.trips.dispatch(trip_id).await.unwrap();
    fleet
        .vehicles
        .update_fields(vehicle.id, VehiclePatch::status(VehicleStatus::Available))
        .await
        .unwrap();

    let cancelled = fleet.trips.cancel(trip_id).await.unwrap();
    assert_eq!(cancelled.trip.status, TripStatus::Cancelled);
    assert_eq!(cancelled.vehicle.status, VehicleStatus::Available);
    assert_eq!(cancelled.driver.status, DriverStatus::OnDuty);
    assert_eq!(cancelled.driver.total_trips, 1);
    assert_eq!(cancelled.driver.completed_trips, 0);
}

/// Store de vehículos donde otra escritura de odómetro se cuela justo antes
/// de la primera escritura que trae odómetro
struct OdometerWriteSneaksIn {
    inner: Arc<MemoryStore>,
    reading: f64,
    armed: AtomicBool,
}

#[async_trait]
impl VehicleRepository for OdometerWriteSneaksIn {
    async fn create(&self, vehicle: &Vehicle) -> AppResult<Vehicle> {
        VehicleRepository::create(self.inner.as_ref(), vehicle).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        VehicleRepository::find_by_id(self.inner.as_ref(), id).await
    }

    async fn find_by_license_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        self.inner.find_by_license_plate(license_plate).await
    }

    async fn list(&self, filters: &VehicleFilters, pagination: Pagination) -> AppResult<Vec<Vehicle>> {
        VehicleRepository::list(self.inner.as_ref(), filters, pagination).await
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<VehicleStatus>,
        patch: &VehiclePatch,
    ) -> AppResult<UpdateOutcome<Vehicle>> {
        if patch.odometer.is_some() && self.armed.swap(false, Ordering::SeqCst) {
            let reading = VehiclePatch {
                odometer: Some(self.reading),
                ..VehiclePatch::default()
            };
            VehicleRepository::update_conditional(self.inner.as_ref(), id, StatusGuard::Any, &reading)
                .await?;
        }
        VehicleRepository::update_conditional(self.inner.as_ref(), id, guard, patch).await
    }
}

fn with_odometer_write_sneaking_in(reading: f64) -> Fleet {
    let store = Arc::new(MemoryStore::new());
    let racing = Arc::new(OdometerWriteSneaksIn {
        inner: store.clone(),
        reading,
        armed: AtomicBool::new(true),
    });
    Fleet::new(Repositories {
        vehicles: racing,
        drivers: store.clone(),
        trips: store.clone(),
        expenses: store,
    })
}

#[tokio::test]
async fn test_completion_never_lowers_odometer_written_concurrently() {
    let fleet = with_odometer_write_sneaking_in(5000.0);
    let vehicle = fleet.truck("TRK-1400", 5000.0, 1000.0).await;
    let driver_id = fleet.driver("DL-1400", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();
    fleet.trips.dispatch(trip_id).await.unwrap();

    let err = fleet.trips.complete(trip_id, completion(1200.0)).await.unwrap_err();
    match err {
        AppError::OdometerRegression {
            final_odometer,
            current,
        } => {
            assert_eq!(final_odometer, 1200.0);
            assert_eq!(current, 5000.0);
        }
        other => panic!("expected OdometerRegression, got {:?}", other),
    }

    let vehicle = fleet.vehicles.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.odometer, 5000.0);
    assert_eq!(vehicle.status, VehicleStatus::OnTrip);
    assert_eq!(fleet.trips.get(trip_id).await.unwrap().status, TripStatus::Dispatched);
    assert_eq!(fleet.drivers.get(driver_id).await.unwrap().total_trips, 0);
}

#[tokio::test]
async fn test_manual_odometer_update_never_lowers_concurrent_reading() {
    let fleet = with_odometer_write_sneaking_in(5000.0);
    let vehicle = fleet.truck("TRK-1410", 5000.0, 1000.0).await;

    let err = fleet
        .vehicles
        .update_fields(
            vehicle.id,
            VehiclePatch {
                odometer: Some(1200.0),
                ..VehiclePatch::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::InvalidOdometer { current, requested } if current == 5000.0 && requested == 1200.0
    ));
    assert_eq!(fleet.vehicles.get(vehicle.id).await.unwrap().odometer, 5000.0);
}

/// Store de viajes donde otra transición cierra el viaje justo antes de la
/// escritura final de un complete
struct TripClosedFirst {
    inner: Arc<MemoryStore>,
    armed: AtomicBool,
}

#[async_trait]
impl TripRepository for TripClosedFirst {
    async fn create(&self, trip: &Trip) -> AppResult<Trip> {
        TripRepository::create(self.inner.as_ref(), trip).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Trip>> {
        TripRepository::find_by_id(self.inner.as_ref(), id).await
    }

    async fn list(&self, filters: &TripFilters, pagination: Pagination) -> AppResult<Vec<Trip>> {
        TripRepository::list(self.inner.as_ref(), filters, pagination).await
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<TripStatus>,
        patch: &TripPatch,
    ) -> AppResult<UpdateOutcome<Trip>> {
        if patch.status == Some(TripStatus::Completed) && self.armed.swap(false, Ordering::SeqCst) {
            let close = TripPatch {
                status: Some(TripStatus::Cancelled),
                ..TripPatch::default()
            };
            TripRepository::update_conditional(self.inner.as_ref(), id, StatusGuard::Any, &close)
                .await?;
        }
        TripRepository::update_conditional(self.inner.as_ref(), id, guard, patch).await
    }
}

#[tokio::test]
async fn test_release_that_loses_the_trip_only_reverts_its_counters() {
    let store = Arc::new(MemoryStore::new());
    let trips = Arc::new(TripClosedFirst {
        inner: store.clone(),
        armed: AtomicBool::new(true),
    });
    let fleet = Fleet::new(Repositories {
        vehicles: store.clone(),
        drivers: store.clone(),
        trips,
        expenses: store.clone(),
    });

    let vehicle = fleet.truck("TRK-1500", 5000.0, 1000.0).await;
    let driver_id = fleet.driver("DL-1500", VehicleType::Truck).await;
    let trip_id = fleet.draft(vehicle.id, driver_id, 100.0).await.unwrap();
    fleet.trips.dispatch(trip_id).await.unwrap();

    let err = fleet.trips.complete(trip_id, completion(1200.0)).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    assert_eq!(fleet.trips.get(trip_id).await.unwrap().status, TripStatus::Cancelled);
    assert_eq!(
        fleet.vehicles.get(vehicle.id).await.unwrap().status,
        VehicleStatus::Available
    );
    let driver = fleet.drivers.get(driver_id).await.unwrap();
    assert_eq!(driver.status, DriverStatus::OnDuty);
    assert_eq!(driver.total_trips, 0);
    assert_eq!(driver.completed_trips, 0);
}

/// Store de conductores que cuenta las escrituras condicionales
struct CountingDriverWrites {
    inner: Arc<MemoryStore>,
    writes: AtomicUsize,
}

#[async_trait]
impl DriverRepository for CountingDriverWrites {
    async fn create(&self, driver: &Driver) -> AppResult<Driver> {
        DriverRepository::create(self.inner.as_ref(), driver).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Driver>> {
        DriverRepository::find_by_id(self.inner.as_ref(), id).await
    }

    async fn find_by_license_number(&self, license_number: &str) -> AppResult<Option<Driver>> {
        self.inner.find_by_license_number(license_number).await
    }

    async fn list(&self, filters: &DriverFilters, pagination: Pagination) -> AppResult<Vec<Driver>> {
        DriverRepository::list(self.inner.as_ref(), filters, pagination).await
    }

    async fn update_conditional(
        &self,
        id: Uuid,
        guard: StatusGuard<DriverStatus>,
        patch: &DriverPatch,
    ) -> AppResult<UpdateOutcome<Driver>> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        DriverRepository::update_conditional(self.inner.as_ref(), id, guard, patch).await
    }
}

#[tokio::test]
async fn test_complaint_updates_counter_and_score_in_one_write() {
    let store = Arc::new(MemoryStore::new());
    let drivers = Arc::new(CountingDriverWrites {
        inner: store.clone(),
        writes: AtomicUsize::new(0),
    });
    let fleet = Fleet::new(Repositories {
        vehicles: store.clone(),
        drivers: drivers.clone(),
        trips: store.clone(),
        expenses: store,
    });
    let driver_id = fleet.driver("DL-1600", VehicleType::Van).await;

    let driver = fleet.drivers.report_complaint(driver_id).await.unwrap();
    assert_eq!(driver.complaints_count, 1);
    assert_eq!(driver.safety_score, 8.0);
    assert_eq!(drivers.writes.load(Ordering::SeqCst), 1);
}
