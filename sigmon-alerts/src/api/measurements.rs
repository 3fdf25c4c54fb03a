//! Classified measurement listing
//!
//! Each stored record with its verdict, per-channel advice and WIB
//! timestamp, newest first.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use sigmon_common::classify::{channel_advice, summary_text, ChannelAdvice};
use sigmon_common::time::format_wib;
use sigmon_common::{classify, Measurement, QualityVerdict};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

const MAX_LIMIT: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct MeasurementsQuery {
    /// Only records from this region (exact match)
    pub region: Option<String>,
    /// Only problem records
    #[serde(default)]
    pub problems_only: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ClassifiedMeasurement {
    #[serde(flatten)]
    pub measurement: Measurement,
    pub verdict: QualityVerdict,
    pub verdict_label: &'static str,
    pub advice: Vec<ChannelAdvice>,
    pub summary: String,
    /// observed_at rendered in UTC+7
    pub observed_local: String,
}

impl ClassifiedMeasurement {
    fn from_measurement(measurement: Measurement) -> Self {
        let verdict = classify(&measurement);
        Self {
            verdict_label: verdict.label(),
            advice: channel_advice(&measurement),
            summary: summary_text(&measurement),
            observed_local: format_wib(&measurement.observed_at),
            verdict,
            measurement,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MeasurementsResponse {
    pub total: usize,
    pub measurements: Vec<ClassifiedMeasurement>,
}

/// GET /api/measurements?region=..&problems_only=true&limit=N
pub async fn get_measurements(
    State(state): State<AppState>,
    Query(query): Query<MeasurementsQuery>,
) -> ApiResult<Json<MeasurementsResponse>> {
    let limit = match query.limit {
        Some(0) => return Err(ApiError::BadRequest("limit must be positive".to_string())),
        Some(n) if n > MAX_LIMIT => {
            return Err(ApiError::BadRequest(format!("limit must not exceed {}", MAX_LIMIT)))
        }
        Some(n) => n,
        None => MAX_LIMIT,
    };

    let mut measurements = state.source.fetch_all().await?;
    measurements.sort_by(|a, b| b.observed_at.cmp(&a.observed_at));

    let classified: Vec<ClassifiedMeasurement> = measurements
        .into_iter()
        .filter(|m| query.region.as_deref().map_or(true, |r| m.region == r))
        .map(ClassifiedMeasurement::from_measurement)
        .filter(|c| !query.problems_only || c.verdict.is_problem())
        .collect();

    let total = classified.len();
    Ok(Json(MeasurementsResponse {
        total,
        measurements: classified.into_iter().take(limit).collect(),
    }))
}
