use async_trait::async_trait;
use sqlx::PgPool;

use super::{ExpenseFilters, ExpenseRepository};
use crate::models::Expense;
use crate::utils::errors::{map_write_error, AppResult};

pub struct PgExpenseRepository {
    pool: PgPool,
}

impl PgExpenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExpenseRepository for PgExpenseRepository {
    async fn create(&self, expense: &Expense) -> AppResult<Expense> {
        let created = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (id, vehicle_id, expense_type, amount, liters, description, date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(expense.id)
        .bind(expense.vehicle_id)
        .bind(expense.expense_type)
        .bind(expense.amount)
        .bind(expense.liters)
        .bind(&expense.description)
        .bind(expense.date)
        .bind(expense.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Expense"))?;

        Ok(created)
    }

    async fn list(&self, filters: &ExpenseFilters) -> AppResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT * FROM expenses
            WHERE ($1::uuid IS NULL OR vehicle_id = $1)
              AND ($2::expense_type IS NULL OR expense_type = $2)
            ORDER BY date DESC
            "#,
        )
        .bind(filters.vehicle_id)
        .bind(filters.expense_type)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}
