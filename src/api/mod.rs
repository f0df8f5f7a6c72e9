//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; system endpoints
//! (`/health`, `/config/statuses`) sit at the root. With the default
//! `swagger-ui` feature, interactive documentation is served at `/docs`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "demoslot-gateway",
        description = "REST API for course demo-slot booking"
    ),
    paths(
        handlers::groups::create_group,
        handlers::groups::list_groups,
        handlers::groups::get_group,
        handlers::groups::get_group_by_slug,
        handlers::groups::update_status,
        handlers::groups::group_fulfillment,
        handlers::groups::group_bookings,
        handlers::slots::preview_slots,
        handlers::slots::create_slots,
        handlers::slots::group_slots,
        handlers::slots::ta_slot_board,
        handlers::slots::delete_slot,
        handlers::slots::delete_slot_admin,
        handlers::bookings::availability,
        handlers::bookings::create_booking,
        handlers::bookings::cancel_booking,
        handlers::bookings::student_bookings,
        handlers::bookings::delete_booking_admin,
        handlers::system::health_handler,
        handlers::system::status_catalog_handler,
    ),
    tags(
        (name = "Groups", description = "Booking-group lifecycle and oversight"),
        (name = "Slots", description = "TA slot scheduling"),
        (name = "Bookings", description = "Student booking and cancellation"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
