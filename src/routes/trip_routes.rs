use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::TripController;
use crate::dto::trip_dto::{CompleteTripRequest, CreateTripRequest, TripListQuery, TripResponse};
use crate::dto::ApiResponse;
use crate::middleware::require_role;
use crate::models::auth::{AuthenticatedUser, Role};
use crate::state::AppState;
use crate::utils::errors::AppError;

const DISPATCH_ROLES: &[Role] = &[Role::Dispatcher, Role::FleetManager];

pub fn create_trip_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trips).post(create_trip))
        .route("/:id/dispatch", post(dispatch_trip))
        .route("/:id/complete", post(complete_trip))
        .route("/:id/cancel", post(cancel_trip))
}

async fn create_trip(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TripResponse>>), AppError> {
    require_role(&user, DISPATCH_ROLES)?;
    let controller = TripController::new(state.repositories.clone());
    let response = controller.create(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_trips(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(query): Query<TripListQuery>,
) -> Result<Json<ApiResponse<Vec<TripResponse>>>, AppError> {
    let controller = TripController::new(state.repositories.clone());
    Ok(Json(controller.list(query).await?))
}

async fn dispatch_trip(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    require_role(&user, DISPATCH_ROLES)?;
    let controller = TripController::new(state.repositories.clone());
    Ok(Json(controller.dispatch(id).await?))
}

async fn complete_trip(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CompleteTripRequest>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    require_role(&user, DISPATCH_ROLES)?;
    let controller = TripController::new(state.repositories.clone());
    Ok(Json(controller.complete(id, request).await?))
}

async fn cancel_trip(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<TripResponse>>, AppError> {
    require_role(&user, DISPATCH_ROLES)?;
    let controller = TripController::new(state.repositories.clone());
    Ok(Json(controller.cancel(id).await?))
}
