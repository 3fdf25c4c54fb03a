//! Server-Sent Events (SSE) utilities
//!
//! Turns EventBus traffic into an axum SSE response so the dashboard can
//! update its notification badge without polling.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};

use crate::events::{EventBus, MonitorEvent};

/// Convert a bus event into an SSE frame named after its type
pub fn to_sse_event(event: &MonitorEvent) -> Option<Event> {
    Event::default()
        .event(event.event_type())
        .json_data(event)
        .ok()
}

/// Create an SSE stream of all future bus events
///
/// Lagged receivers skip the dropped events and keep streaming.
pub fn create_event_sse_stream(
    bus: &EventBus,
    service_name: &'static str,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(
        "New SSE client connected to {} events, total clients: {}",
        service_name,
        bus.subscriber_count() + 1
    );

    let stream = BroadcastStream::new(bus.subscribe()).filter_map(|result| async move {
        match result {
            Ok(event) => to_sse_event(&event).map(Ok),
            Err(e) => {
                warn!("SSE client lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
