//! Modelo de Expense (append-only)

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Tipo de gasto - mapea al ENUM expense_type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "expense_type")]
pub enum ExpenseType {
    Fuel,
    Maintenance,
}

impl fmt::Display for ExpenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseType::Fuel => f.write_str("Fuel"),
            ExpenseType::Maintenance => f.write_str("Maintenance"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    /// Sólo tiene sentido para gastos de combustible
    pub liters: Option<f64>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub vehicle_id: Uuid,
    pub expense_type: ExpenseType,
    pub amount: Decimal,
    pub liters: Option<f64>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn record(new: NewExpense, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: new.vehicle_id,
            expense_type: new.expense_type,
            amount: new.amount,
            liters: new.liters,
            description: new.description,
            date: new.date.unwrap_or(now),
            created_at: now,
        }
    }
}
