//! Event types for the SIGMON event system
//!
//! Provides the feed lifecycle events and the EventBus the UI layer listens on.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::notification::Notification;

/// Feed lifecycle and notification events
///
/// Broadcast via EventBus and serialized as-is for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MonitorEvent {
    /// Feed started: catch-up requested and push subscription being opened
    FeedStarted {
        /// Push event name being listened to
        push_event: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Historical catch-up finished and its problems were appended
    CatchUpCompleted {
        /// Measurements received from the bulk read
        measurements: usize,
        /// Notifications appended from this batch
        notifications_added: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Historical catch-up failed; the feed continues in push-only mode
    CatchUpFailed {
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Push subscription could not be opened
    PushUnavailable {
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A new notification was appended
    ///
    /// Triggers:
    /// - SSE: update badge count and dropdown
    NotificationRaised {
        notification: Notification,
        /// List length after the append
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Push subscription released
    FeedStopped {
        /// Notifications held at the time of stop
        total: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl MonitorEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            MonitorEvent::FeedStarted { .. } => "FeedStarted",
            MonitorEvent::CatchUpCompleted { .. } => "CatchUpCompleted",
            MonitorEvent::CatchUpFailed { .. } => "CatchUpFailed",
            MonitorEvent::PushUnavailable { .. } => "PushUnavailable",
            MonitorEvent::NotificationRaised { .. } => "NotificationRaised",
            MonitorEvent::FeedStopped { .. } => "FeedStopped",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the feed)
/// - Multiple concurrent subscribers (SSE clients, log sinks, tests)
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use sigmon_common::events::{EventBus, MonitorEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(MonitorEvent::FeedStopped {
///     total: 0,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "FeedStopped");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MonitorEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: MonitorEvent,
    ) -> Result<usize, broadcast::error::SendError<MonitorEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: MonitorEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
