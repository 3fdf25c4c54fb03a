//! Health check endpoint
//!
//! Besides liveness, reports whether the alert feed is still listening for
//! pushed measurements and how many notifications it holds.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Push subscription active (feed started and not stopped)
    pub feed_live: bool,
    /// Current notification badge count
    pub notifications: usize,
    /// Connected `/api/events` clients and other bus listeners
    pub event_subscribers: usize,
}

/// GET /health
///
/// `status` is "degraded" once the feed has stopped listening.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let feed_live = state.notifications.is_live();
    Json(HealthResponse {
        status: if feed_live { "ok" } else { "degraded" }.to_string(),
        module: "sigmon-alerts".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        feed_live,
        notifications: state.notifications.count(),
        event_subscribers: state.event_bus.subscriber_count(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
