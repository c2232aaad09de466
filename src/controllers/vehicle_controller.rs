use uuid::Uuid;
use validator::Validate;

use crate::dto::vehicle_dto::{
    CreateVehicleRequest, UpdateVehicleRequest, VehicleListQuery, VehicleResponse,
};
use crate::dto::ApiResponse;
use crate::repositories::Repositories;
use crate::services::VehicleService;
use crate::utils::errors::AppError;

pub struct VehicleController {
    service: VehicleService,
}

impl VehicleController {
    pub fn new(repositories: Repositories) -> Self {
        Self {
            service: VehicleService::new(repositories),
        }
    }

    pub async fn register(
        &self,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;
        let vehicle = self.service.register(request.into()).await?;
        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehicle registered successfully",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let vehicle = self.service.get(id).await?;
        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehicle fetched successfully",
        ))
    }

    pub async fn list(
        &self,
        query: VehicleListQuery,
    ) -> Result<ApiResponse<Vec<VehicleResponse>>, AppError> {
        let (filters, pagination) = query.into_parts();
        let vehicles = self.service.list(&filters, pagination).await?;
        Ok(ApiResponse::success_with_message(
            vehicles.into_iter().map(VehicleResponse::from).collect(),
            "Vehicles fetched successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;
        let vehicle = self.service.update_fields(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehicle updated successfully",
        ))
    }
}
