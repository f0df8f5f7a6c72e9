//! System endpoints: health check and the status catalog.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::domain::{GroupAction, GroupStatus};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// What one lifecycle status permits, and where it can go next.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusInfo {
    /// The status being described.
    pub status: GroupStatus,
    /// Students may book a slot.
    pub student_can_book: bool,
    /// Students may cancel their booking.
    pub student_can_cancel: bool,
    /// TAs may add and delete slots.
    pub ta_can_edit_slots: bool,
    /// TAs may see who booked their slots.
    pub ta_can_view_bookings: bool,
    /// The group appears in student listings.
    pub listed_for_students: bool,
    /// TAs may open the group at all.
    pub accessible_to_tas: bool,
    /// Statuses an administrator may move the group to from here.
    pub transitions_to: Vec<GroupStatus>,
}

/// `GET /config/statuses` — The lifecycle catalog.
///
/// UIs derive their enabled/disabled affordances from this table instead
/// of re-encoding the rules per view.
#[utoipa::path(
    get,
    path = "/config/statuses",
    tag = "System",
    summary = "Lifecycle status catalog",
    description = "For every group status: which student and TA actions it permits and which transitions an administrator may apply.",
    responses(
        (status = 200, description = "Status catalog", body = Vec<StatusInfo>),
    )
)]
pub async fn status_catalog_handler() -> impl IntoResponse {
    let catalog: Vec<StatusInfo> = GroupStatus::ALL
        .into_iter()
        .map(|status| StatusInfo {
            status,
            student_can_book: status.allows(GroupAction::StudentBook),
            student_can_cancel: status.allows(GroupAction::StudentCancel),
            ta_can_edit_slots: status.allows(GroupAction::TaAddSlot),
            ta_can_view_bookings: status.allows(GroupAction::TaViewBookings),
            listed_for_students: status.listed_for_students(),
            accessible_to_tas: status.accessible_to_tas(),
            transitions_to: GroupStatus::ALL
                .into_iter()
                .filter(|next| status.can_transition_to(*next))
                .collect(),
        })
        .collect();
    (StatusCode::OK, Json(catalog))
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/statuses", get(status_catalog_handler))
}
