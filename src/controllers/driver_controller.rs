use uuid::Uuid;
use validator::Validate;

use crate::dto::driver_dto::{
    CreateDriverRequest, DriverListQuery, DriverResponse, UpdateDriverRequest,
};
use crate::dto::ApiResponse;
use crate::repositories::Repositories;
use crate::services::DriverService;
use crate::utils::errors::AppError;

pub struct DriverController {
    service: DriverService,
}

impl DriverController {
    pub fn new(repositories: Repositories) -> Self {
        Self {
            service: DriverService::new(repositories),
        }
    }

    pub async fn register(
        &self,
        request: CreateDriverRequest,
    ) -> Result<ApiResponse<DriverResponse>, AppError> {
        request.validate()?;
        let driver = self.service.register(request.into()).await?;
        Ok(ApiResponse::success_with_message(
            driver.into(),
            "Driver registered successfully",
        ))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<ApiResponse<DriverResponse>, AppError> {
        let driver = self.service.get(id).await?;
        Ok(ApiResponse::success_with_message(
            driver.into(),
            "Driver fetched successfully",
        ))
    }

    pub async fn list(
        &self,
        query: DriverListQuery,
    ) -> Result<ApiResponse<Vec<DriverResponse>>, AppError> {
        let (filters, pagination) = query.into_parts();
        let drivers = self.service.list(&filters, pagination).await?;
        Ok(ApiResponse::success_with_message(
            drivers.into_iter().map(DriverResponse::from).collect(),
            "Drivers fetched successfully",
        ))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateDriverRequest,
    ) -> Result<ApiResponse<DriverResponse>, AppError> {
        request.validate()?;
        let driver = self.service.update(id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            driver.into(),
            "Driver updated successfully",
        ))
    }

    pub async fn report_complaint(&self, id: Uuid) -> Result<ApiResponse<DriverResponse>, AppError> {
        let driver = self.service.report_complaint(id).await?;
        Ok(ApiResponse::success_with_message(
            driver.into(),
            "Complaint reported and score recalculated",
        ))
    }
}
