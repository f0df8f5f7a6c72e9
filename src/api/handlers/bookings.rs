//! Booking handlers: availability, the delegated atomic booking and
//! cancellation, and the student and admin booking views.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::booking_dto::{
    CancelBookingParams, CreateBookingRequest, CreateBookingResponse,
};
use crate::app_state::AppState;
use crate::domain::{BookingId, GroupId, SlotId, StudentId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{BookingWithSlot, SlotOccupancy};

/// `GET /groups/{id}/availability` — Slots a student can still book.
///
/// # Errors
///
/// Returns [`GatewayError::ActionNotAllowed`] unless the group is
/// published.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}/availability",
    tag = "Bookings",
    summary = "List bookable slots",
    description = "Future slots with seats remaining in a published group. Counts are a display-time prediction; the atomic booking procedure makes the final call, so a subsequent booking attempt may still be rejected.",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Bookable slots with seats left", body = Vec<SlotOccupancy>),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group is not published", body = ErrorResponse),
    )
)]
pub async fn availability(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let slots = state
        .booking_service
        .available_slots(GroupId::from_uuid(id), Utc::now())
        .await?;
    Ok(Json(slots))
}

/// `POST /bookings` — Book a slot through the atomic procedure.
///
/// # Errors
///
/// Returns [`GatewayError::AlreadyBooked`] or [`GatewayError::SlotFull`]
/// when the procedure declines; both mean the caller's view was stale and
/// the error details name what to re-fetch.
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "Book a slot",
    description = "Delegates to the atomic booking procedure, which enforces capacity and one booking per student per group. Rejections are expected outcomes, not failures: re-fetch availability and let the student pick again.",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking confirmed", body = CreateBookingResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Already booked, slot full, or group not published", body = ErrorResponse),
        (status = 422, description = "Procedure rejected the booking", body = ErrorResponse),
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let booking_id = state
        .booking_service
        .book_slot(
            SlotId::from_uuid(req.booking_slot_id),
            GroupId::from_uuid(req.booking_group_id),
            StudentId::from_uuid(req.student_id),
        )
        .await?;
    let response = CreateBookingResponse {
        booking_id,
        message: "Your demo slot has been reserved".to_string(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `DELETE /bookings/{id}` — Cancel a student's booking.
///
/// # Errors
///
/// Returns [`GatewayError::ActionNotAllowed`] unless the group is still
/// published, or [`GatewayError::BookingNotFound`].
#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Cancel a booking",
    description = "Delegates to the atomic cancellation procedure. On success the seat and the student's one-booking-per-group allowance are free again. Locked groups keep their bookings.",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
        CancelBookingParams,
    ),
    responses(
        (status = 204, description = "Booking cancelled"),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Group is not published", body = ErrorResponse),
    )
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<CancelBookingParams>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .booking_service
        .cancel_booking(
            BookingId::from_uuid(id),
            StudentId::from_uuid(params.student_id),
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /students/{id}/bookings` — A student's bookings with their slots.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/bookings",
    tag = "Bookings",
    summary = "A student's bookings",
    params(("id" = uuid::Uuid, Path, description = "Student UUID")),
    responses(
        (status = 200, description = "Bookings with slot details, newest first", body = Vec<BookingWithSlot>),
    )
)]
pub async fn student_bookings(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let bookings = state
        .booking_service
        .student_bookings(StudentId::from_uuid(id))
        .await?;
    Ok(Json(bookings))
}

/// `DELETE /admin/bookings/{id}` — Delete a booking directly.
///
/// # Errors
///
/// Returns [`GatewayError::BookingNotFound`] when absent.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/bookings/{id}",
    tag = "Bookings",
    summary = "Delete a booking (admin)",
    description = "Removes a booking without the status gate, freeing the seat so the student can rebook.",
    params(("id" = uuid::Uuid, Path, description = "Booking UUID")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn delete_booking_admin(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .booking_service
        .delete_booking_as_admin(BookingId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/{id}/availability", get(availability))
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", delete(cancel_booking))
        .route("/students/{id}/bookings", get(student_bookings))
        .route("/admin/bookings/{id}", delete(delete_booking_admin))
}
