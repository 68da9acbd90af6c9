//! Open-Meteo historical weather archive client.
//!
//! Only the daily precipitation sum is requested; the pipeline needs the
//! calendar-year total.

use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::models::{PrecipitationRecord, PrecipitationSource};
use crate::utils::constants::OPEN_METEO_ARCHIVE_URL;

#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: DailySeries,
}

#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ArchiveError {
    reason: String,
}

impl OpenMeteoClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OPEN_METEO_ARCHIVE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn fetch_annual_precipitation(
        &self,
        latitude: f64,
        longitude: f64,
        year: i32,
        timezone: &str,
    ) -> Result<PrecipitationRecord> {
        let start = format!("{}-01-01", year);
        let end = format!("{}-12-31", year);

        debug!(
            "Requesting daily precipitation for {:.4}, {:.4} from {} to {}",
            latitude, longitude, start, end
        );

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("start_date", start),
                ("end_date", end),
                ("daily", "precipitation_sum".to_string()),
                ("timezone", timezone.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let reason = serde_json::from_str::<ArchiveError>(&body)
                .map(|e| e.reason)
                .unwrap_or(body);
            return Err(PipelineError::Upstream(format!(
                "Open-Meteo request failed with status {}: {}",
                status, reason
            )));
        }

        let record = parse_archive_response(&body, year)?;
        info!("Annual precipitation {}", record);
        Ok(record)
    }
}

/// Sums the daily series. Null days are skipped; a series with no values at all is an error.
pub fn parse_archive_response(body: &str, year: i32) -> Result<PrecipitationRecord> {
    let response: ArchiveResponse = serde_json::from_str(body).map_err(|e| {
        PipelineError::Upstream(format!("Failed to parse Open-Meteo response: {}", e))
    })?;
    let daily = response.daily;

    if daily.time.len() != daily.precipitation_sum.len() {
        return Err(PipelineError::InvalidFormat(format!(
            "Open-Meteo returned {} dates but {} precipitation values",
            daily.time.len(),
            daily.precipitation_sum.len()
        )));
    }

    let observed: Vec<f64> = daily.precipitation_sum.iter().flatten().copied().collect();
    if observed.is_empty() {
        return Err(PipelineError::Upstream(format!(
            "Open-Meteo returned no precipitation observations for {}",
            year
        )));
    }

    let missing = daily.precipitation_sum.len() - observed.len();
    if missing > 0 {
        warn!("{} days without precipitation data were skipped", missing);
    }

    if let (Some(first), Some(last)) = (daily.time.first(), daily.time.last()) {
        let first = parse_day(first)?;
        let last = parse_day(last)?;
        debug!("Precipitation series covers {} to {}", first, last);
    }

    let total: f64 = observed.iter().sum();
    Ok(PrecipitationRecord::new(total, year, PrecipitationSource::Fetched)?
        .with_observed_days(observed.len()))
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| PipelineError::InvalidFormat(format!("Invalid date in daily series: '{}'", s)))
}
