//! Booking DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::BookingId;

/// Request body for `POST /bookings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// The slot to claim.
    pub booking_slot_id: uuid::Uuid,
    /// The group the slot belongs to.
    pub booking_group_id: uuid::Uuid,
    /// The student making the claim.
    pub student_id: uuid::Uuid,
}

/// Response body for `POST /bookings` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateBookingResponse {
    /// Identifier of the new booking.
    pub booking_id: BookingId,
    /// Confirmation message for display.
    pub message: String,
}

/// Query parameters for student-scoped cancellation.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CancelBookingParams {
    /// The student who holds the booking.
    pub student_id: uuid::Uuid,
}
