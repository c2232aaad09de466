//! Registro de gastos
//!
//! Los gastos son append-only. Un gasto de mantenimiento manda además el
//! vehículo al taller; ese efecto no se revierte automáticamente.

use chrono::Utc;
use tracing::{info, warn};

use crate::models::{Expense, ExpenseType, NewExpense, VehiclePatch, VehicleStatus};
use crate::repositories::{ExpenseFilters, Repositories, StatusGuard, UpdateOutcome};
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct ExpenseService {
    repositories: Repositories,
}

impl ExpenseService {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }

    pub async fn log(&self, new: NewExpense) -> AppResult<Expense> {
        let expense = self
            .repositories
            .expenses
            .create(&Expense::record(new, Utc::now()))
            .await?;
        info!(
            "💶 Gasto {} registrado: {} para el vehículo {}",
            expense.expense_type, expense.amount, expense.vehicle_id
        );

        if expense.expense_type == ExpenseType::Maintenance {
            self.send_to_shop(&expense).await;
        }

        Ok(expense)
    }

    pub async fn list(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>> {
        self.repositories.expenses.list(filters).await
    }

    /// Pasa el vehículo a In Shop sea cual sea su estado. Un fallo aquí no
    /// invalida el gasto ya persistido.
    async fn send_to_shop(&self, expense: &Expense) {
        let patch = VehiclePatch {
            status: Some(VehicleStatus::InShop),
            last_maintenance_date: Some(expense.date),
            ..VehiclePatch::default()
        };

        match self
            .repositories
            .vehicles
            .update_conditional(expense.vehicle_id, StatusGuard::Any, &patch)
            .await
        {
            Ok(UpdateOutcome::Updated(vehicle)) => {
                info!("🔧 Vehículo {} enviado al taller", vehicle.license_plate);
            }
            Ok(_) => warn!(
                "⚠️  Gasto {} registrado pero el vehículo {} no existe",
                expense.id, expense.vehicle_id
            ),
            Err(e) => warn!(
                "⚠️  Gasto {} registrado pero no se pudo actualizar el vehículo {}: {}",
                expense.id, expense.vehicle_id, e
            ),
        }
    }
}
