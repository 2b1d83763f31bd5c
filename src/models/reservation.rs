use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ReservationStatus {
    WaitingApprove,
    OnGoing,
    Completed,
    CanceledByUser,
    CanceledByAdmin,
}

impl ReservationStatus {
    /// Only completed and on-going reservations count toward revenue.
    pub fn is_eligible(self) -> bool {
        matches!(self, ReservationStatus::Completed | ReservationStatus::OnGoing)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservationStatus::WaitingApprove => write!(f, "waiting-approve"),
            ReservationStatus::OnGoing => write!(f, "on-going"),
            ReservationStatus::Completed => write!(f, "completed"),
            ReservationStatus::CanceledByUser => write!(f, "canceled-by-user"),
            ReservationStatus::CanceledByAdmin => write!(f, "canceled-by-admin"),
        }
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting-approve" => Ok(ReservationStatus::WaitingApprove),
            "on-going" => Ok(ReservationStatus::OnGoing),
            "completed" => Ok(ReservationStatus::Completed),
            "canceled-by-user" => Ok(ReservationStatus::CanceledByUser),
            "canceled-by-admin" => Ok(ReservationStatus::CanceledByAdmin),
            other => Err(AppError::ValidationError(format!(
                "Unknown reservation status: {other}"
            ))),
        }
    }
}

/// A reservation as delivered by the upstream reservation API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    pub id: String,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub invoice: String,
    #[schema(example = "2025-06-15 10:00")]
    pub date_time: String, // YYYY-MM-DD HH:MM, naive local time
    pub status: ReservationStatus,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub amount: u64,
}

// 上游可能返回 null 金额，按 0 处理
fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}
