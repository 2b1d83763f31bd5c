use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{DashboardReport, ReservationRecord};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(DashboardApiResponse = ApiResponse<DashboardReport>, ReservationListApiResponse = ApiResponse<Vec<ReservationRecord>>)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }
}
