//! HTTP API handlers for sigmon-alerts

pub mod health;
pub mod insights;
pub mod measurements;
pub mod notifications;
pub mod sse;

pub use health::health_routes;
pub use insights::get_insights;
pub use measurements::get_measurements;
pub use notifications::get_notifications;
pub use sse::event_stream;
