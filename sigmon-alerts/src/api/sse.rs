//! Server-Sent Events for feed activity

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /api/events - SSE stream of MonitorEvents
///
/// Streams feed lifecycle events and one `NotificationRaised` per appended
/// notification, carrying the new total for badge updates.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sigmon_common::sse::create_event_sse_stream(&state.event_bus, "sigmon-alerts")
}
