//! Slot handlers: preview, bulk creation, listings, and deletion.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::slot_dto::{
    CreateSlotsRequest, CreateSlotsResponse, DeleteSlotParams, PreviewSlotsRequest,
};
use crate::app_state::AppState;
use crate::domain::{GroupId, SlotId, TaId};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::{SlotOccupancy, SlotPlanPreview, TaSlotBoard};

/// `POST /groups/{id}/slots/preview` — Count the slots a batch would
/// create, without writing anything.
///
/// # Errors
///
/// Returns a validation [`GatewayError`] when the range is empty, escapes
/// the group's daily window, or is not divisible by the slot duration.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/slots/preview",
    tag = "Slots",
    summary = "Preview a slot batch",
    description = "Runs the range, window, and divisibility checks for a proposed batch and reports the resulting slot count. Overlap against existing slots is only checked at creation time.",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    request_body = PreviewSlotsRequest,
    responses(
        (status = 200, description = "Slot count for the range", body = SlotPlanPreview),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 422, description = "Range fails validation", body = ErrorResponse),
    )
)]
pub async fn preview_slots(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<PreviewSlotsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let preview = state
        .booking_service
        .preview_slots(
            GroupId::from_uuid(id),
            req.date,
            req.start_time,
            req.end_time,
            req.slot_duration_minutes,
        )
        .await?;
    Ok(Json(preview))
}

/// `POST /groups/{id}/slots` — Bulk-create a TA's slots for one date.
///
/// # Errors
///
/// Returns [`GatewayError::ActionNotAllowed`] unless the group is hidden,
/// or a validation failure (range, window, divisibility, overlap) before
/// anything is persisted.
#[utoipa::path(
    post,
    path = "/api/v1/groups/{id}/slots",
    tag = "Slots",
    summary = "Create a slot batch",
    description = "Divides the time range into equal slots, validates it against the group's daily window and the TA's existing slots on that date, and inserts the whole batch in one statement. Times are interpreted in the caller's UTC offset.",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    request_body = CreateSlotsRequest,
    responses(
        (status = 201, description = "Batch created", body = CreateSlotsResponse),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group is not hidden", body = ErrorResponse),
        (status = 422, description = "Range fails validation or overlaps", body = ErrorResponse),
    )
)]
pub async fn create_slots(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<CreateSlotsRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let slots = state
        .booking_service
        .create_slots(GroupId::from_uuid(id), &req.into_spec())
        .await?;
    let response = CreateSlotsResponse {
        created: slots.len(),
        slots,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /groups/{id}/slots` — All slots in a group with booking counts.
///
/// # Errors
///
/// Returns [`GatewayError::GroupNotFound`] if the group does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}/slots",
    tag = "Slots",
    summary = "List a group's slots with occupancy",
    description = "Administrator view of every slot in the group and its current booking count, read through one batched count query.",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Slots with occupancy", body = Vec<SlotOccupancy>),
        (status = 404, description = "Group not found", body = ErrorResponse),
    )
)]
pub async fn group_slots(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let occupancy = state
        .booking_service
        .slot_occupancy(GroupId::from_uuid(id))
        .await?;
    Ok(Json(occupancy))
}

/// `GET /groups/{id}/tas/{ta_id}/slots` — A TA's slot board for a group.
///
/// # Errors
///
/// Returns [`GatewayError::ActionNotAllowed`] for an inactive group.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}/tas/{ta_id}/slots",
    tag = "Slots",
    summary = "A TA's slot board",
    description = "The TA's slots in this group plus their hour-requirement progress. Once the group is published or locked, each slot also lists the students booked into it.",
    params(
        ("id" = uuid::Uuid, Path, description = "Group UUID"),
        ("ta_id" = uuid::Uuid, Path, description = "TA UUID"),
    ),
    responses(
        (status = 200, description = "Slot board", body = TaSlotBoard),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Group is inactive", body = ErrorResponse),
    )
)]
pub async fn ta_slot_board(
    State(state): State<AppState>,
    Path((id, ta_id)): Path<(uuid::Uuid, uuid::Uuid)>,
) -> Result<impl IntoResponse, GatewayError> {
    let board = state
        .booking_service
        .ta_slot_board(GroupId::from_uuid(id), TaId::from_uuid(ta_id))
        .await?;
    Ok(Json(board))
}

/// `DELETE /slots/{id}` — A TA deletes one of their own slots.
///
/// # Errors
///
/// Returns [`GatewayError::ActionNotAllowed`] once the group has left
/// `hidden`, or [`GatewayError::SlotNotFound`] when the slot is absent or
/// owned by someone else.
#[utoipa::path(
    delete,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    summary = "Delete an own slot",
    description = "TA-scoped deletion: only touches a slot owned by the given TA, and only while the group is still hidden.",
    params(
        ("id" = uuid::Uuid, Path, description = "Slot UUID"),
        DeleteSlotParams,
    ),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "Slot not found or not owned", body = ErrorResponse),
        (status = 409, description = "Group is no longer hidden", body = ErrorResponse),
    )
)]
pub async fn delete_slot(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Query(params): Query<DeleteSlotParams>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .booking_service
        .delete_slot_as_ta(SlotId::from_uuid(id), TaId::from_uuid(params.ta_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /admin/slots/{id}` — Delete any slot, cascading to bookings.
///
/// # Errors
///
/// Returns [`GatewayError::SlotNotFound`] when absent.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/slots/{id}",
    tag = "Slots",
    summary = "Delete a slot (admin)",
    description = "Removes a slot regardless of group status. Existing bookings on the slot are removed with it.",
    params(("id" = uuid::Uuid, Path, description = "Slot UUID")),
    responses(
        (status = 204, description = "Slot deleted"),
        (status = 404, description = "Slot not found", body = ErrorResponse),
    )
)]
pub async fn delete_slot_admin(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    state
        .booking_service
        .delete_slot_as_admin(SlotId::from_uuid(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Slot management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups/{id}/slots", post(create_slots).get(group_slots))
        .route("/groups/{id}/slots/preview", post(preview_slots))
        .route("/groups/{id}/tas/{ta_id}/slots", get(ta_slot_board))
        .route("/slots/{id}", delete(delete_slot))
        .route("/admin/slots/{id}", delete(delete_slot_admin))
}
