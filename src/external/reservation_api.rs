use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ReservationApiConfig;
use crate::error::{AppError, AppResult};
use crate::models::ReservationRecord;

#[derive(Debug, Deserialize)]
pub struct UpstreamResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> UpstreamResponse<T> {
    pub fn into_data(self, context: &str) -> AppResult<T> {
        if !self.success {
            let reason = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(AppError::ExternalApiError(format!("{context}: {reason}")));
        }

        self.data
            .ok_or_else(|| AppError::ExternalApiError(format!("{context}: empty response data")))
    }
}

/// Decodes records one by one; a record that does not fit the contract is
/// dropped with a warning instead of failing the whole list.
pub fn decode_reservations(values: Vec<serde_json::Value>) -> Vec<ReservationRecord> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let id = value
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or("<missing id>")
                .to_string();
            match serde_json::from_value::<ReservationRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Dropping upstream reservation #{index} ({id}): {e}");
                    None
                }
            }
        })
        .collect()
}

/// Client for the upstream store that owns reservations.
#[derive(Clone)]
pub struct ReservationApi {
    client: Client,
    config: ReservationApiConfig,
}

impl ReservationApi {
    pub fn new(config: ReservationApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub async fn get_reservations(&self) -> AppResult<Vec<ReservationRecord>> {
        let url = self.url("/admin/reservation");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Failed to fetch reservations ({status}): {error_text}"
            )));
        }

        let result: UpstreamResponse<Vec<serde_json::Value>> = response.json().await?;
        let values = result.into_data("Failed to fetch reservations")?;
        let total = values.len();
        let reservations = decode_reservations(values);

        log::debug!(
            "Fetched {} of {total} reservations from {}",
            reservations.len(),
            url
        );

        Ok(reservations)
    }
}
