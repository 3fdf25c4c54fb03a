//! External collaborators consumed by the alert feed
//!
//! - [`MeasurementSource`]: one-shot bulk read of all known measurements
//! - [`PushChannel`]: subscription delivering new measurements one at a time
//!
//! Implementations: HTTP bulk reader, SSE push client, in-memory channel.

use async_trait::async_trait;
use sigmon_common::{Measurement, TransportError};
use tokio::sync::mpsc;

pub mod http;
pub mod memory;
pub mod sse_client;

pub use http::HttpMeasurementSource;
pub use memory::{InMemoryPushChannel, StaticMeasurementSource};
pub use sse_client::SsePushChannel;

/// Bulk reader for historical measurements
#[async_trait]
pub trait MeasurementSource: Send + Sync {
    /// Fetch every measurement the service currently knows about
    ///
    /// # Returns
    /// * `Ok(Vec<Measurement>)` - in the service's delivery order
    /// * `Err(TransportError)` - network, HTTP status or body parse failure
    async fn fetch_all(&self) -> Result<Vec<Measurement>, TransportError>;
}

/// Push delivery of newly created measurements
pub trait PushChannel: Send + Sync {
    /// Start listening for `event_name` deliveries
    ///
    /// Reconnection after a dropped connection is the channel's concern;
    /// the subscription keeps yielding measurements across reconnects.
    fn subscribe(&self, event_name: &str) -> Result<PushSubscription, TransportError>;
}

/// Live subscription handle
///
/// Dropping the handle (or calling [`PushSubscription::unsubscribe`])
/// releases the underlying connection exactly once.
pub struct PushSubscription {
    rx: mpsc::UnboundedReceiver<Measurement>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl PushSubscription {
    pub fn new(
        rx: mpsc::UnboundedReceiver<Measurement>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            rx,
            release: Some(Box::new(release)),
        }
    }

    /// Next delivered measurement, `None` once the channel is closed
    pub async fn next(&mut self) -> Option<Measurement> {
        self.rx.recv().await
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for PushSubscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_release_runs_once_on_unsubscribe() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();
        let (_tx, rx) = mpsc::unbounded_channel();

        let subscription = PushSubscription::new(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        subscription.unsubscribe();

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_next_ends_when_sender_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscription = PushSubscription::new(rx, || {});
        drop(tx);
        assert!(subscription.next().await.is_none());
    }
}
