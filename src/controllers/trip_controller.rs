use uuid::Uuid;
use validator::Validate;

use crate::dto::trip_dto::{CompleteTripRequest, CreateTripRequest, TripListQuery, TripResponse};
use crate::dto::ApiResponse;
use crate::repositories::Repositories;
use crate::services::TripService;
use crate::utils::errors::AppError;

pub struct TripController {
    service: TripService,
}

impl TripController {
    pub fn new(repositories: Repositories) -> Self {
        Self {
            service: TripService::new(repositories),
        }
    }

    pub async fn create(
        &self,
        request: CreateTripRequest,
    ) -> Result<ApiResponse<TripResponse>, AppError> {
        request.validate()?;
        let trip = self.service.create(request.into()).await?;
        Ok(ApiResponse::success_with_message(trip.into(), "Trip created as Draft"))
    }

    pub async fn list(&self, query: TripListQuery) -> Result<ApiResponse<Vec<TripResponse>>, AppError> {
        let (filters, pagination) = query.into_parts();
        let trips = self.service.list(&filters, pagination).await?;
        Ok(ApiResponse::success_with_message(
            trips.into_iter().map(TripResponse::from).collect(),
            "Trips fetched successfully",
        ))
    }

    pub async fn dispatch(&self, id: Uuid) -> Result<ApiResponse<TripResponse>, AppError> {
        let outcome = self.service.dispatch(id).await?;
        Ok(ApiResponse::success_with_message(
            outcome.trip.into(),
            "Trip dispatched successfully",
        ))
    }

    pub async fn complete(
        &self,
        id: Uuid,
        request: CompleteTripRequest,
    ) -> Result<ApiResponse<TripResponse>, AppError> {
        let outcome = self.service.complete(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            outcome.trip.into(),
            "Trip completed successfully",
        ))
    }

    pub async fn cancel(&self, id: Uuid) -> Result<ApiResponse<TripResponse>, AppError> {
        let outcome = self.service.cancel(id).await?;
        Ok(ApiResponse::success_with_message(
            outcome.trip.into(),
            "Trip cancelled successfully",
        ))
    }
}
