//! A student's claim on a slot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{BookingId, GroupId, SlotId, StudentId};

/// A student's claim on exactly one slot within a booking group.
///
/// The group reference is denormalized onto the booking so the store can
/// enforce at most one booking per `(student, group)` pair; capacity per
/// slot is enforced by the atomic booking procedure, not by this crate.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// The claimed slot.
    pub booking_slot_id: SlotId,
    /// Group the slot belongs to.
    pub booking_group_id: GroupId,
    /// Student holding the claim.
    pub student_id: StudentId,
    /// When the claim was made.
    pub booked_at: DateTime<Utc>,
}
