//! Live alert feed
//!
//! Collects a notification for every problem measurement seen during the
//! session, from two independent sources:
//!
//! 1. **Historical catch-up**: one bulk read when the feed starts. All of
//!    its notifications are appended as one contiguous batch, after any
//!    push entries that happened to arrive first.
//! 2. **Push deliveries**: handled one at a time, in arrival order, until
//!    the feed is stopped.
//!
//! The notification list only grows. Readers get snapshots through
//! [`NotificationsView`]; every append is also published on the EventBus as
//! `MonitorEvent::NotificationRaised`.
//!
//! `stop()` releases the push subscription. A catch-up read already in
//! flight is not cancelled and still appends its batch.

use chrono::{DateTime, Utc};
use sigmon_common::events::{EventBus, MonitorEvent};
use sigmon_common::time::{format_wib, now};
use sigmon_common::{classify, Measurement, Notification, TransportError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::transport::{MeasurementSource, PushChannel, PushSubscription};

/// Feed behaviour switches
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Push event carrying new measurements
    pub push_event: String,
    /// Skip measurements whose (region, subregion, observed_at) already
    /// raised a notification this session
    pub suppress_duplicates: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            push_event: "new_data".to_string(),
            suppress_duplicates: false,
        }
    }
}

/// Result of the historical catch-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchUpOutcome {
    Completed {
        measurements: usize,
        notifications_added: usize,
    },
    Failed(TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupKey {
    region: String,
    subregion: String,
    observed_at: DateTime<Utc>,
}

impl DedupKey {
    fn of(measurement: &Measurement) -> Self {
        Self {
            region: measurement.region.clone(),
            subregion: measurement.subregion.clone(),
            observed_at: measurement.observed_at,
        }
    }
}

#[derive(Default)]
struct FeedState {
    notifications: Vec<Notification>,
    accepting_push: bool,
    seen: HashSet<DedupKey>,
}

/// State shared between the feed handle and its tasks
#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<FeedState>>,
    event_bus: EventBus,
    suppress_duplicates: bool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, FeedState> {
        // Appends never leave the state half-written, so a poisoned lock is still usable
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append under an already-held lock; returns false if suppressed
    fn append_locked(
        &self,
        state: &mut FeedState,
        key: DedupKey,
        notification: Notification,
    ) -> bool {
        if self.suppress_duplicates && !state.seen.insert(key) {
            return false;
        }
        state.notifications.push(notification);
        true
    }

    fn announce(&self, raised: Vec<(Notification, usize)>) {
        for (notification, total) in raised {
            self.event_bus.emit_lossy(MonitorEvent::NotificationRaised {
                notification,
                total,
                timestamp: now(),
            });
        }
    }

    fn handle_pushed(&self, measurement: Measurement) {
        let verdict = classify(&measurement);
        debug!(
            location = %measurement.location(),
            observed = %format_wib(&measurement.observed_at),
            verdict = verdict.label(),
            "Push measurement classified"
        );

        let Some(notification) = Notification::for_verdict(&measurement, &verdict) else {
            return;
        };

        let raised = {
            let mut state = self.lock();
            if !state.accepting_push {
                debug!("Feed stopped, dropping pushed measurement");
                return;
            }
            if !self.append_locked(&mut state, DedupKey::of(&measurement), notification.clone()) {
                debug!(location = %notification.location, "Duplicate notification suppressed");
                return;
            }
            (notification, state.notifications.len())
        };

        info!(
            location = %raised.0.location,
            channels = %raised.0.deficient_channels.join(", "),
            "Signal problem reported"
        );
        self.announce(vec![raised]);
    }

    fn append_batch(&self, measurements: &[Measurement]) -> usize {
        let candidates: Vec<(DedupKey, Notification)> = measurements
            .iter()
            .filter_map(|m| {
                Notification::for_verdict(m, &classify(m)).map(|n| (DedupKey::of(m), n))
            })
            .collect();

        let raised: Vec<(Notification, usize)> = {
            let mut state = self.lock();
            let mut raised = Vec::new();
            for (key, notification) in candidates {
                if self.append_locked(&mut state, key, notification.clone()) {
                    raised.push((notification, state.notifications.len()));
                }
            }
            raised
        };

        let added = raised.len();
        self.announce(raised);
        added
    }
}

async fn run_catch_up(source: Arc<dyn MeasurementSource>, shared: Shared) -> CatchUpOutcome {
    match source.fetch_all().await {
        Ok(measurements) => {
            let added = shared.append_batch(&measurements);
            info!(
                measurements = measurements.len(),
                notifications = added,
                "Historical catch-up completed"
            );
            shared.event_bus.emit_lossy(MonitorEvent::CatchUpCompleted {
                measurements: measurements.len(),
                notifications_added: added,
                timestamp: now(),
            });
            CatchUpOutcome::Completed {
                measurements: measurements.len(),
                notifications_added: added,
            }
        }
        Err(e) => {
            warn!("Historical catch-up failed, continuing with push only: {}", e);
            shared.event_bus.emit_lossy(MonitorEvent::CatchUpFailed {
                error: e.to_string(),
                timestamp: now(),
            });
            CatchUpOutcome::Failed(e)
        }
    }
}

async fn run_push_loop(mut subscription: PushSubscription, shared: Shared) {
    while let Some(measurement) = subscription.next().await {
        shared.handle_pushed(measurement);
    }
    debug!("Push subscription closed");
}

/// Read-only access to the feed's notifications
///
/// Cheap to clone; hand this to the UI layer instead of the feed itself.
#[derive(Clone)]
pub struct NotificationsView {
    state: Arc<Mutex<FeedState>>,
}

impl NotificationsView {
    /// Copy of the current list, in arrival order
    pub fn snapshot(&self) -> Vec<Notification> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .notifications
            .clone()
    }

    pub fn count(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .notifications
            .len()
    }

    /// True between `start` and `stop`: pushed problems are still appended
    pub fn is_live(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .accepting_push
    }
}

/// Session-scoped problem notification feed
///
/// Owns the push subscription from `start` until `stop` or drop.
/// `start` spawns tasks and must be called inside a Tokio runtime.
pub struct LiveAlertFeed {
    source: Arc<dyn MeasurementSource>,
    push: Arc<dyn PushChannel>,
    options: FeedOptions,
    shared: Shared,
    catch_up: Option<JoinHandle<CatchUpOutcome>>,
    push_task: Option<JoinHandle<()>>,
    running: bool,
}

impl LiveAlertFeed {
    pub fn new(
        source: Arc<dyn MeasurementSource>,
        push: Arc<dyn PushChannel>,
        event_bus: EventBus,
        options: FeedOptions,
    ) -> Self {
        let shared = Shared {
            state: Arc::new(Mutex::new(FeedState::default())),
            event_bus,
            suppress_duplicates: options.suppress_duplicates,
        };

        Self {
            source,
            push,
            options,
            shared,
            catch_up: None,
            push_task: None,
            running: false,
        }
    }

    /// Begin the session: request the catch-up and open the push subscription
    ///
    /// Returns immediately. A failed catch-up or subscription is logged and
    /// published; the other source keeps working. No-op if already running.
    pub fn start(&mut self) {
        if self.running {
            warn!("Alert feed already running, ignoring start");
            return;
        }
        self.running = true;
        self.shared.lock().accepting_push = true;

        info!(push_event = %self.options.push_event, "Starting alert feed");
        self.shared.event_bus.emit_lossy(MonitorEvent::FeedStarted {
            push_event: self.options.push_event.clone(),
            timestamp: now(),
        });

        self.catch_up = Some(tokio::spawn(run_catch_up(
            Arc::clone(&self.source),
            self.shared.clone(),
        )));

        match self.push.subscribe(&self.options.push_event) {
            Ok(subscription) => {
                self.push_task = Some(tokio::spawn(run_push_loop(
                    subscription,
                    self.shared.clone(),
                )));
            }
            Err(e) => {
                warn!("Push subscription unavailable: {}", e);
                self.shared.event_bus.emit_lossy(MonitorEvent::PushUnavailable {
                    error: e.to_string(),
                    timestamp: now(),
                });
            }
        }
    }

    /// Release the push subscription
    ///
    /// Idempotent and safe before `start`. Once this returns no pushed
    /// measurement is appended.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        let total = {
            let mut state = self.shared.lock();
            state.accepting_push = false;
            state.notifications.len()
        };

        if let Some(task) = self.push_task.take() {
            // Dropping the aborted future drops the subscription, which releases it
            task.abort();
        }

        info!(total, "Alert feed stopped");
        self.shared.event_bus.emit_lossy(MonitorEvent::FeedStopped {
            total,
            timestamp: now(),
        });
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Snapshot of notifications in arrival order
    pub fn current_notifications(&self) -> Vec<Notification> {
        self.view().snapshot()
    }

    pub fn notification_count(&self) -> usize {
        self.view().count()
    }

    pub fn view(&self) -> NotificationsView {
        NotificationsView {
            state: Arc::clone(&self.shared.state),
        }
    }

    /// Subscribe to feed events (badge updates, lifecycle)
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<MonitorEvent> {
        self.shared.event_bus.subscribe()
    }

    /// Wait for the historical catch-up started by `start`
    ///
    /// Returns `None` if there is no pending catch-up (not started, already
    /// awaited, or the task was cancelled).
    pub async fn wait_for_catch_up(&mut self) -> Option<CatchUpOutcome> {
        let handle = self.catch_up.take()?;
        handle.await.ok()
    }
}

impl Drop for LiveAlertFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InMemoryPushChannel, StaticMeasurementSource};
    use sigmon_common::AudioVideo;

    fn measurement(subregion: &str, power: f64) -> Measurement {
        Measurement {
            id: None,
            region: "Bandung".to_string(),
            subregion: subregion.to_string(),
            power,
            carrier_to_noise: 22.0,
            modulation_error_ratio: 29.0,
            link_margin: 7.0,
            audio_video: AudioVideo::Present,
            latitude: None,
            longitude: None,
            observed_at: "2025-03-01T08:00:00Z".parse().unwrap(),
            owner_user_name: "tester".to_string(),
        }
    }

    fn feed_with(source: StaticMeasurementSource, push: Arc<InMemoryPushChannel>) -> LiveAlertFeed {
        LiveAlertFeed::new(Arc::new(source), push, EventBus::new(64), FeedOptions::default())
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let push = Arc::new(InMemoryPushChannel::new());
        let mut feed = feed_with(StaticMeasurementSource::new(vec![]), push);
        feed.stop();
        feed.stop();
        assert!(!feed.is_running());
        assert!(feed.current_notifications().is_empty());
    }

    #[tokio::test]
    async fn test_catch_up_keeps_delivery_order() {
        let push = Arc::new(InMemoryPushChannel::new());
        let source = StaticMeasurementSource::new(vec![
            measurement("first", 40.0),
            measurement("fine", 50.0),
            measurement("second", 41.0),
        ]);
        let mut feed = feed_with(source, push);
        feed.start();

        let outcome = feed.wait_for_catch_up().await;
        assert_eq!(
            outcome,
            Some(CatchUpOutcome::Completed {
                measurements: 3,
                notifications_added: 2
            })
        );

        let locations: Vec<String> = feed
            .current_notifications()
            .into_iter()
            .map(|n| n.location)
            .collect();
        assert_eq!(locations, vec!["Bandung, first", "Bandung, second"]);
        assert!(feed.wait_for_catch_up().await.is_none());
    }

    #[tokio::test]
    async fn test_double_start_subscribes_once() {
        let push = Arc::new(InMemoryPushChannel::new());
        let mut feed = feed_with(StaticMeasurementSource::new(vec![]), push.clone());
        feed.start();
        feed.start();
        assert_eq!(push.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let push = Arc::new(InMemoryPushChannel::new());
        {
            let mut feed = feed_with(StaticMeasurementSource::new(vec![]), push.clone());
            feed.start();
            assert_eq!(push.subscriber_count(), 1);
        }
        // Abort is processed on the next scheduler turn
        for _ in 0..10 {
            if push.subscriber_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(push.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dedup_key_uses_location_and_time() {
        let a = measurement("x", 40.0);
        let mut b = a.clone();
        b.power = 10.0;
        assert_eq!(DedupKey::of(&a), DedupKey::of(&b));

        let mut c = a.clone();
        c.observed_at = "2025-03-01T08:00:01Z".parse().unwrap();
        assert_ne!(DedupKey::of(&a), DedupKey::of(&c));
    }
}
