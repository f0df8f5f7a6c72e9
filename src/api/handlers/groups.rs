//! Booking-group handlers: creation, listing, status changes, and the
//! admin oversight views.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use crate::api::dto::group_dto::{CreateGroupRequest, ListGroupsParams, UpdateStatusRequest};
use crate::app_state::AppState;
use crate::domain::booking_group::BookingGroup;
use crate::domain::GroupId;
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::models::StudentBooking;
use crate::service::TaFulfillment;

/// `POST /groups` — Create a booking group.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] on violated invariants or a
/// slug collision.
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "Groups",
    summary = "Create a booking group",
    description = "Creates a demo booking group. The slug is derived from the name when omitted; status defaults to hidden so TAs can build out slots before students see anything.",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created", body = BookingGroup),
        (status = 400, description = "Invalid group definition", body = ErrorResponse),
    )
)]
pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let group = state.booking_service.create_group(req.into_spec()).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// `GET /groups` — List groups for an audience.
///
/// # Errors
///
/// Returns [`GatewayError`] on internal failures.
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "Groups",
    summary = "List booking groups",
    description = "Returns groups filtered by audience: admins see everything, TAs see hidden and published groups, students see published groups only.",
    params(ListGroupsParams),
    responses(
        (status = 200, description = "Groups, newest first", body = Vec<BookingGroup>),
    )
)]
pub async fn list_groups(
    State(state): State<AppState>,
    Query(params): Query<ListGroupsParams>,
) -> Result<impl IntoResponse, GatewayError> {
    let groups = state
        .booking_service
        .list_groups(params.audience.statuses())
        .await?;
    Ok(Json(groups))
}

/// `GET /groups/{id}` — Get one group.
///
/// # Errors
///
/// Returns [`GatewayError::GroupNotFound`] if the group does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}",
    tag = "Groups",
    summary = "Get a booking group",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "The group", body = BookingGroup),
        (status = 404, description = "Group not found", body = ErrorResponse),
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let group = state.booking_service.group(GroupId::from_uuid(id)).await?;
    Ok(Json(group))
}

/// `GET /groups/by-slug/{slug}` — Get one group by its URL slug.
///
/// # Errors
///
/// Returns [`GatewayError::SlugNotFound`] if no group carries the slug.
#[utoipa::path(
    get,
    path = "/api/v1/groups/by-slug/{slug}",
    tag = "Groups",
    summary = "Get a booking group by slug",
    params(("slug" = String, Path, description = "Group slug")),
    responses(
        (status = 200, description = "The group", body = BookingGroup),
        (status = 404, description = "Group not found", body = ErrorResponse),
    )
)]
pub async fn get_group_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let group = state.booking_service.group_by_slug(&slug).await?;
    Ok(Json(group))
}

/// `PATCH /groups/{id}/status` — Move a group through its lifecycle.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidTransition`] for moves outside
/// `hidden → published → locked` / `* → inactive`.
#[utoipa::path(
    patch,
    path = "/api/v1/groups/{id}/status",
    tag = "Groups",
    summary = "Change a group's lifecycle status",
    description = "Applies a forward-only lifecycle transition. Backward moves are rejected so slot editing can never reopen on a group students have already seen; inactive is terminal.",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Group with its new status", body = BookingGroup),
        (status = 404, description = "Group not found", body = ErrorResponse),
        (status = 409, description = "Illegal transition", body = ErrorResponse),
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let group = state
        .booking_service
        .change_status(GroupId::from_uuid(id), req.status)
        .await?;
    Ok(Json(group))
}

/// `GET /groups/{id}/tas` — Per-TA fulfillment report.
///
/// # Errors
///
/// Returns [`GatewayError::GroupNotFound`] if the group does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}/tas",
    tag = "Groups",
    summary = "Per-TA hour-requirement report",
    description = "Every known TA's committed minutes in this group against the requirement, zero-slot TAs included.",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Fulfillment per TA", body = Vec<TaFulfillment>),
        (status = 404, description = "Group not found", body = ErrorResponse),
    )
)]
pub async fn group_fulfillment(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let report = state
        .booking_service
        .group_fulfillment(GroupId::from_uuid(id))
        .await?;
    Ok(Json(report))
}

/// `GET /groups/{id}/bookings` — All bookings in a group.
///
/// # Errors
///
/// Returns [`GatewayError::GroupNotFound`] if the group does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/groups/{id}/bookings",
    tag = "Groups",
    summary = "List a group's bookings",
    description = "Administrator view: every booking in the group with the student holding it, newest first.",
    params(("id" = uuid::Uuid, Path, description = "Group UUID")),
    responses(
        (status = 200, description = "Bookings with students", body = Vec<StudentBooking>),
        (status = 404, description = "Group not found", body = ErrorResponse),
    )
)]
pub async fn group_bookings(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let bookings = state
        .booking_service
        .group_bookings(GroupId::from_uuid(id))
        .await?;
    Ok(Json(bookings))
}

/// Group management routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", post(create_group).get(list_groups))
        .route("/groups/by-slug/{slug}", get(get_group_by_slug))
        .route("/groups/{id}", get(get_group))
        .route("/groups/{id}/status", patch(update_status))
        .route("/groups/{id}/tas", get(group_fulfillment))
        .route("/groups/{id}/bookings", get(group_bookings))
}
