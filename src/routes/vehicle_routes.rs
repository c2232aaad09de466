use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::VehicleController;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, UpdateVehicleRequest, VehicleListQuery, VehicleResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::require_role;
use crate::models::auth::{AuthenticatedUser, Role};
use crate::state::AppState;
use crate::utils::errors::AppError;

const MANAGE_ROLES: &[Role] = &[Role::FleetManager];

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route("/:id", get(get_vehicle).put(update_vehicle).patch(update_vehicle))
}

async fn create_vehicle(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<VehicleResponse>>), AppError> {
    require_role(&user, MANAGE_ROLES)?;
    let controller = VehicleController::new(state.repositories.clone());
    let response = controller.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_vehicles(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<VehicleListQuery>,
) -> Result<Json<ApiResponse<Vec<VehicleResponse>>>, AppError> {
    let controller = VehicleController::new(state.repositories.clone());
    Ok(Json(controller.list(query).await?))
}

async fn get_vehicle(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = VehicleController::new(state.repositories.clone());
    Ok(Json(controller.get_by_id(id).await?))
}

async fn update_vehicle(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    require_role(&user, MANAGE_ROLES)?;
    let controller = VehicleController::new(state.repositories.clone());
    Ok(Json(controller.update(id, request).await?))
}
