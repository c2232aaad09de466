use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::DriverController;
use crate::dto::driver_dto::{
    CreateDriverRequest, DriverListQuery, DriverResponse, UpdateDriverRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::require_role;
use crate::models::auth::{AuthenticatedUser, Role};
use crate::state::AppState;
use crate::utils::errors::AppError;

const MANAGE_ROLES: &[Role] = &[Role::FleetManager, Role::SafetyOfficer];
const COMPLAINT_ROLES: &[Role] = &[Role::SafetyOfficer];

pub fn create_driver_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_drivers).post(create_driver))
        .route("/:id", get(get_driver).put(update_driver).patch(update_driver))
        .route("/:id/complaint", post(report_complaint))
}

async fn create_driver(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateDriverRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DriverResponse>>), AppError> {
    require_role(&user, MANAGE_ROLES)?;
    let controller = DriverController::new(state.repositories.clone());
    let response = controller.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_drivers(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<DriverListQuery>,
) -> Result<Json<ApiResponse<Vec<DriverResponse>>>, AppError> {
    let controller = DriverController::new(state.repositories.clone());
    Ok(Json(controller.list(query).await?))
}

async fn get_driver(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    let controller = DriverController::new(state.repositories.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_driver(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDriverRequest>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    require_role(&user, MANAGE_ROLES)?;
    let controller = DriverController::new(state.repositories.clone());
    Ok(Json(controller.update(id, request).await?))
}

async fn report_complaint(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<DriverResponse>>, AppError> {
    require_role(&user, COMPLAINT_ROLES)?;
    let controller = DriverController::new(state.repositories.clone());
    Ok(Json(controller.report_complaint(id).await?))
}
