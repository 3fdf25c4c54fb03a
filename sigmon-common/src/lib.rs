//! # SIGMON Common Library
//!
//! Shared code for the signal-monitoring services including:
//! - Measurement records and their wire format
//! - Signal-quality classification (verdicts, bands, advice)
//! - Notifications, insights and band distributions
//! - Event types (MonitorEvent) and the EventBus
//! - Configuration loading
//! - SSE and time utilities

pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod insights;
pub mod measurement;
pub mod notification;
pub mod sse;
pub mod time;

pub use classify::{classify, Channel, ChannelBand, QualityTier, QualityVerdict};
pub use error::{Error, Result, TransportError};
pub use measurement::{AudioVideo, Measurement, RecordId};
pub use notification::Notification;
