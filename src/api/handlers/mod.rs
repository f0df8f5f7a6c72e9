//! REST endpoint handlers organized by resource.

pub mod bookings;
pub mod groups;
pub mod slots;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(groups::routes())
        .merge(slots::routes())
        .merge(bookings::routes())
}
