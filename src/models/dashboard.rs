use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;

/// Chart granularity requested by the dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
            Period::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "yearly" => Ok(Period::Yearly),
            other => Err(AppError::ValidationError(format!(
                "Unknown period '{other}', expected weekly, monthly or yearly"
            ))),
        }
    }
}

/// Inclusive bounds of the current period and the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub current_start: NaiveDateTime,
    pub current_end: NaiveDateTime,
    pub prev_start: NaiveDateTime,
    pub prev_end: NaiveDateTime,
}

impl PeriodRange {
    pub fn in_current(&self, at: NaiveDateTime) -> bool {
        at >= self.current_start && at <= self.current_end
    }

    pub fn in_previous(&self, at: NaiveDateTime) -> bool {
        at >= self.prev_start && at <= self.prev_end
    }
}

/// One point on the dashboard chart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ChartBucket {
    #[serde(rename = "xAxis")]
    #[schema(example = "January")]
    pub label: String,
    pub income: u64,
    #[serde(rename = "customer")]
    pub customer_count: u64,
}

impl ChartBucket {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            income: 0,
            customer_count: 0,
        }
    }

    pub(crate) fn add(&mut self, amount: u64) {
        self.income += amount;
        self.customer_count += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_income: u64,
    pub total_customers: u64,
    #[serde(rename = "incomeTrend")]
    pub income_trend_pct: f64,
    #[serde(rename = "customerTrend")]
    pub customer_trend_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub chart_data: Vec<ChartBucket>,
    pub stats: DashboardStats,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardQuery {
    /// weekly, monthly or yearly
    pub period: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WaitingReservationQuery {
    pub limit: Option<usize>,
}
