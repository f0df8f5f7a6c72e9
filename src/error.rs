//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! Validation failures from the scheduling core arrive as typed values and
//! are converted here; rejections from the atomic booking procedures carry
//! the slot or group identifier so a client knows what to re-fetch before
//! trying again.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::group_status::{GroupAction, GroupStatus};
use crate::domain::schedule::PlanError;
use crate::domain::timezone::TimezoneError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4003,
///     "message": "This slot is full",
///     "details": "refresh availability for slot 7f2c…"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`GatewayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category              | HTTP Status                |
/// |-----------|-----------------------|----------------------------|
/// | 1000–1999 | Request validation    | 400 Bad Request            |
/// | 2000–2099 | Not found             | 404 Not Found              |
/// | 2100–2199 | Status gate           | 409 Conflict               |
/// | 3000–3999 | Server / persistence  | 500 Internal Server Error  |
/// | 4000–4999 | Domain rejection      | 409 Conflict / 422         |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Booking group with the given ID was not found.
    #[error("booking group not found: {0}")]
    GroupNotFound(uuid::Uuid),

    /// Booking group with the given slug was not found.
    #[error("booking group not found for slug: {0}")]
    SlugNotFound(String),

    /// Slot with the given ID was not found (or not owned by the caller).
    #[error("slot not found: {0}")]
    SlotNotFound(uuid::Uuid),

    /// Booking with the given ID was not found.
    #[error("booking not found: {0}")]
    BookingNotFound(uuid::Uuid),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Slot-batch planning rejected the requested range.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Wall-clock input could not be resolved to an instant.
    #[error(transparent)]
    Timezone(#[from] TimezoneError),

    /// The group's lifecycle status forbids the attempted action.
    #[error("{action} is not allowed while the booking group is {status}")]
    ActionNotAllowed {
        /// Current status of the group.
        status: GroupStatus,
        /// The action that was attempted.
        action: GroupAction,
    },

    /// The requested status change is not a legal lifecycle transition.
    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the group is currently in.
        from: GroupStatus,
        /// Status the caller asked for.
        to: GroupStatus,
    },

    /// The atomic procedure reported the student already holds a booking
    /// in this group.
    #[error("{message}")]
    AlreadyBooked {
        /// Message from the booking procedure.
        message: String,
        /// Group whose bookings should be re-fetched.
        group_id: uuid::Uuid,
    },

    /// The atomic procedure reported the slot filled up since the caller
    /// last read availability.
    #[error("{message}")]
    SlotFull {
        /// Message from the booking procedure.
        message: String,
        /// Slot whose availability should be re-fetched.
        slot_id: uuid::Uuid,
    },

    /// Any other rejection from an atomic procedure.
    #[error("booking rejected: {0}")]
    BookingRejected(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Timezone(_) => 1002,
            Self::GroupNotFound(_) => 2001,
            Self::SlotNotFound(_) => 2002,
            Self::BookingNotFound(_) => 2003,
            Self::SlugNotFound(_) => 2004,
            Self::ActionNotAllowed { .. } => 2101,
            Self::InvalidTransition { .. } => 2102,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::Plan(_) => 4001,
            Self::AlreadyBooked { .. } => 4002,
            Self::SlotFull { .. } => 4003,
            Self::BookingRejected(_) => 4004,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Timezone(_) => StatusCode::BAD_REQUEST,
            Self::GroupNotFound(_)
            | Self::SlugNotFound(_)
            | Self::SlotNotFound(_)
            | Self::BookingNotFound(_) => StatusCode::NOT_FOUND,
            Self::ActionNotAllowed { .. }
            | Self::InvalidTransition { .. }
            | Self::AlreadyBooked { .. }
            | Self::SlotFull { .. } => StatusCode::CONFLICT,
            Self::Plan(_) | Self::BookingRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PersistenceError(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Recovery hint attached to the response body, when one exists.
    ///
    /// Rejections from the atomic procedures mean the caller's view is
    /// stale; the details name exactly what to re-fetch.
    #[must_use]
    pub fn details(&self) -> Option<String> {
        match self {
            Self::AlreadyBooked { group_id, .. } => Some(format!(
                "refresh your bookings for group {group_id} before trying again"
            )),
            Self::SlotFull { slot_id, .. } => {
                Some(format!("refresh availability for slot {slot_id}"))
            }
            _ => None,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
