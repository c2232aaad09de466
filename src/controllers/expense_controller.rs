use validator::Validate;

use crate::dto::expense_dto::{CreateExpenseRequest, ExpenseListQuery, ExpenseResponse};
use crate::dto::ApiResponse;
use crate::repositories::Repositories;
use crate::services::ExpenseService;
use crate::utils::errors::AppError;

pub struct ExpenseController {
    service: ExpenseService,
}

impl ExpenseController {
    pub fn new(repositories: Repositories) -> Self {
        Self {
            service: ExpenseService::new(repositories),
        }
    }

    pub async fn log(
        &self,
        request: CreateExpenseRequest,
    ) -> Result<ApiResponse<ExpenseResponse>, AppError> {
        request.validate()?;
        let expense = self.service.log(request.into()).await?;
        Ok(ApiResponse::success_with_message(
            expense.into(),
            "Expense logged successfully",
        ))
    }

    pub async fn list(
        &self,
        query: ExpenseListQuery,
    ) -> Result<ApiResponse<Vec<ExpenseResponse>>, AppError> {
        let expenses = self.service.list(&query.into()).await?;
        Ok(ApiResponse::success(
            expenses.into_iter().map(ExpenseResponse::from).collect(),
        ))
    }
}
