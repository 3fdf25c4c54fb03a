//! sigmon-alerts library - live signal-problem notifications
//!
//! Runs the [`feed::LiveAlertFeed`] against the monitoring service and
//! exposes its notifications, insights and events over a small read API.

use axum::Router;
use sigmon_common::events::EventBus;
use std::sync::Arc;

pub mod api;
pub mod error;
pub mod feed;
pub mod transport;

use feed::NotificationsView;
use transport::MeasurementSource;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only view of the running feed's notifications
    pub notifications: NotificationsView,
    /// Bulk reader used for insights and listings
    pub source: Arc<dyn MeasurementSource>,
    /// Feed events, re-streamed to SSE clients
    pub event_bus: EventBus,
    /// Most recent measurements considered by insights
    pub insight_window: usize,
}

impl AppState {
    pub fn new(
        notifications: NotificationsView,
        source: Arc<dyn MeasurementSource>,
        event_bus: EventBus,
        insight_window: usize,
    ) -> Self {
        Self {
            notifications,
            source,
            event_bus,
            insight_window,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route("/api/notifications", get(api::get_notifications))
        .route("/api/insights", get(api::get_insights))
        .route("/api/measurements", get(api::get_measurements))
        .route("/api/events", get(api::event_stream));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
        .with_state(state)
}
