//! Notification list endpoint

use axum::{extract::State, Json};
use serde::Serialize;
use sigmon_common::Notification;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    /// Badge count
    pub count: usize,
    pub notifications: Vec<Notification>,
}

/// GET /api/notifications
///
/// Snapshot of the session's notifications in arrival order.
pub async fn get_notifications(State(state): State<AppState>) -> Json<NotificationsResponse> {
    let notifications = state.notifications.snapshot();
    Json(NotificationsResponse {
        count: notifications.len(),
        notifications,
    })
}
