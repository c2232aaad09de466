use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Expense, ExpenseType, NewExpense};
use crate::repositories::ExpenseFilters;

// Request para registrar un gasto
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    #[serde(alias = "vehicle")]
    pub vehicle_id: Uuid,
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    #[validate(range(min = 0.0))]
    pub liters: Option<f64>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "crate::utils::validation::deserialize_optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

impl From<CreateExpenseRequest> for NewExpense {
    fn from(request: CreateExpenseRequest) -> Self {
        Self {
            vehicle_id: request.vehicle_id,
            expense_type: request.expense_type,
            amount: request.amount,
            liters: request.liters,
            description: request.description,
            date: request.date,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseListQuery {
    #[serde(alias = "vehicle")]
    pub vehicle_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub expense_type: Option<ExpenseType>,
}

impl From<ExpenseListQuery> for ExpenseFilters {
    fn from(query: ExpenseListQuery) -> Self {
        Self {
            vehicle_id: query.vehicle_id,
            expense_type: query.expense_type,
        }
    }
}

// Response de gasto
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    #[serde(rename = "type")]
    pub expense_type: ExpenseType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub liters: Option<f64>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseResponse {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            vehicle_id: expense.vehicle_id,
            expense_type: expense.expense_type,
            amount: expense.amount,
            liters: expense.liters,
            description: expense.description,
            date: expense.date,
            created_at: expense.created_at,
        }
    }
}
