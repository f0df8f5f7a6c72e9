//! Seat availability and TA hour-requirement accounting.
//!
//! Availability here is a prediction for display: the authoritative
//! accept/reject decision is made by the atomic booking procedure, and a
//! `SLOT_FULL` rejection after a positive prediction is an expected,
//! recoverable outcome — the caller re-fetches and tries again.

use serde::Serialize;
use utoipa::ToSchema;

use super::slot::BookingSlot;

/// `true` while at least one seat remains on a slot.
#[must_use]
pub const fn has_availability(booked: u32, capacity: u32) -> bool {
    booked < capacity
}

/// Seats remaining on a slot. Never underflows, even if overbooked data
/// ever shows up in a count.
#[must_use]
pub const fn spots_left(booked: u32, capacity: u32) -> u32 {
    capacity.saturating_sub(booked)
}

/// A TA's progress toward a group's required demo minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RequirementProgress {
    /// Minutes the TA has committed across their slots.
    pub total_minutes: u32,
    /// Minutes the group requires of each TA.
    pub required_minutes: u32,
    /// Number of slots contributing to the total.
    pub slot_count: u32,
    /// Whether the committed minutes meet the requirement.
    pub is_complete: bool,
}

impl RequirementProgress {
    /// Sums committed minutes across `slots` and compares the total to the
    /// group's requirement. Overlap among one TA's slots is rejected at
    /// creation time, so plain summation cannot double-count.
    #[must_use]
    pub fn assess(slots: &[BookingSlot], required_minutes: u32) -> Self {
        let total: i64 = slots.iter().map(BookingSlot::duration_minutes).sum();
        let total_minutes = u32::try_from(total.max(0)).unwrap_or(u32::MAX);
        Self {
            total_minutes,
            required_minutes,
            slot_count: u32::try_from(slots.len()).unwrap_or(u32::MAX),
            is_complete: total_minutes >= required_minutes,
        }
    }

    /// Fraction of the requirement met, clamped to `[0, 1]`. A zero
    /// requirement is always fully met.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.required_minutes == 0 {
            1.0
        } else {
            (f64::from(self.total_minutes) / f64::from(self.required_minutes)).min(1.0)
        }
    }
}
