use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::controllers::ExpenseController;
use crate::dto::expense_dto::{CreateExpenseRequest, ExpenseListQuery, ExpenseResponse};
use crate::dto::ApiResponse;
use crate::middleware::require_role;
use crate::models::auth::{AuthenticatedUser, Role};
use crate::state::AppState;
use crate::utils::errors::AppError;

const FINANCE_ROLES: &[Role] = &[Role::FinancialAnalyst, Role::FleetManager];

pub fn create_expense_router() -> Router<AppState> {
    Router::new().route("/", get(list_expenses).post(log_expense))
}

async fn log_expense(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), AppError> {
    require_role(&user, FINANCE_ROLES)?;
    let controller = ExpenseController::new(state.repositories.clone());
    let response = controller.log(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_expenses(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<ApiResponse<Vec<ExpenseResponse>>>, AppError> {
    require_role(&user, FINANCE_ROLES)?;
    let controller = ExpenseController::new(state.repositories.clone());
    Ok(Json(controller.list(query).await?))
}
