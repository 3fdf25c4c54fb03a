//! Regional insights and band distribution
//!
//! Both are derived from a fresh bulk read of the monitoring service, so
//! they reflect every stored measurement rather than only problem ones.

use axum::{extract::State, Json};
use serde::Serialize;
use sigmon_common::insights::{generate_insights, BandDistribution, RegionInsight};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    /// Number of measurements the distribution was computed over
    pub measurements: usize,
    pub insights: Vec<RegionInsight>,
    pub distribution: BandDistribution,
}

/// GET /api/insights
pub async fn get_insights(State(state): State<AppState>) -> ApiResult<Json<InsightsResponse>> {
    let measurements = state.source.fetch_all().await?;
    let insights = generate_insights(&measurements, state.insight_window);
    debug!(
        measurements = measurements.len(),
        regions = insights.len(),
        "Insights generated"
    );

    Ok(Json(InsightsResponse {
        measurements: measurements.len(),
        insights,
        distribution: BandDistribution::from_measurements(&measurements),
    }))
}
