//! In-process collaborators
//!
//! Used when measurements are produced inside the same process (replays,
//! embedding) and by the test suites.

use async_trait::async_trait;
use sigmon_common::{Measurement, TransportError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::debug;

use super::{MeasurementSource, PushChannel, PushSubscription};

struct Subscriber {
    id: u64,
    event_name: String,
    tx: mpsc::UnboundedSender<Measurement>,
}

/// Push channel fed by [`InMemoryPushChannel::publish`]
#[derive(Default)]
pub struct InMemoryPushChannel {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl InMemoryPushChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a measurement to every live subscriber of `event_name`
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, event_name: &str, measurement: Measurement) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|s| !s.tx.is_closed());

        subscribers
            .iter()
            .filter(|s| s.event_name == event_name)
            .filter(|s| s.tx.send(measurement.clone()).is_ok())
            .count()
    }

    pub fn subscriber_count(&self) -> usize {
        let subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.iter().filter(|s| !s.tx.is_closed()).count()
    }
}

impl PushChannel for InMemoryPushChannel {
    fn subscribe(&self, event_name: &str) -> Result<PushSubscription, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Subscriber {
                id,
                event_name: event_name.to_string(),
                tx,
            });

        let subscribers = Arc::clone(&self.subscribers);
        Ok(PushSubscription::new(rx, move || {
            subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|s| s.id != id);
            debug!(id, "In-memory subscription released");
        }))
    }
}

/// Bulk source returning a fixed result
pub struct StaticMeasurementSource {
    result: Result<Vec<Measurement>, TransportError>,
}

impl StaticMeasurementSource {
    pub fn new(measurements: Vec<Measurement>) -> Self {
        Self {
            result: Ok(measurements),
        }
    }

    pub fn failing(error: TransportError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl MeasurementSource for StaticMeasurementSource {
    async fn fetch_all(&self) -> Result<Vec<Measurement>, TransportError> {
        self.result.clone()
    }
}
