//! Store port: the persistence capabilities the service depends on.
//!
//! One async trait so orchestration code stays independent of the concrete
//! database; the PostgreSQL implementation lives in [`super::postgres`].
//! Booking counts are read through one batched query rather than a query
//! per slot, and the two atomic procedures are opaque, all-or-nothing
//! calls whose rejections are ordinary values, not errors.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{StudentBooking, TeachingAssistant};
use crate::domain::booking::Booking;
use crate::domain::booking_group::{BookingGroup, GroupSpec};
use crate::domain::slot::{BookingSlot, NewBookingSlot};
use crate::domain::{BookingId, GroupId, GroupStatus, SlotId, StudentId, TaId};
use crate::error::GatewayError;

/// Result of the atomic booking procedure.
///
/// The procedure is authoritative: a rejection means the caller's view of
/// availability was stale, and the right reaction is to re-fetch, never to
/// retry blindly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    /// The booking row was created.
    Confirmed(BookingId),
    /// The student already holds a booking in this group.
    AlreadyBooked {
        /// Message from the procedure.
        message: String,
    },
    /// Capacity was exhausted between read and write.
    SlotFull {
        /// Message from the procedure.
        message: String,
    },
    /// Any other rejection.
    Rejected {
        /// Message from the procedure.
        message: String,
    },
}

/// Result of the atomic cancellation procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The booking no longer exists; its seat and the student's
    /// one-per-group allowance are free again.
    Cancelled,
    /// No booking matched the `(booking, student)` pair.
    NotFound {
        /// Message from the procedure.
        message: String,
    },
    /// Any other rejection.
    Rejected {
        /// Message from the procedure.
        message: String,
    },
}

/// The persistence capabilities the booking service is written against.
#[async_trait]
pub trait BookingStore: Send + Sync + std::fmt::Debug {
    /// Inserts a new booking group and returns the stored row.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] on a slug collision;
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn insert_group(&self, spec: &GroupSpec) -> Result<BookingGroup, GatewayError>;

    /// Fetches a group by ID.
    ///
    /// # Errors
    ///
    /// [`GatewayError::GroupNotFound`] when absent.
    async fn group_by_id(&self, id: GroupId) -> Result<BookingGroup, GatewayError>;

    /// Fetches a group by slug.
    ///
    /// # Errors
    ///
    /// [`GatewayError::SlugNotFound`] when absent.
    async fn group_by_slug(&self, slug: &str) -> Result<BookingGroup, GatewayError>;

    /// Lists groups, optionally restricted to the given statuses
    /// (an empty filter means all), newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn list_groups(&self, statuses: &[GroupStatus]) -> Result<Vec<BookingGroup>, GatewayError>;

    /// Updates a group's status. Transition legality is the caller's job.
    ///
    /// # Errors
    ///
    /// [`GatewayError::GroupNotFound`] when absent.
    async fn update_group_status(&self, id: GroupId, status: GroupStatus) -> Result<(), GatewayError>;

    /// Bulk-inserts a slot batch. All rows land or none do.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn insert_slots(&self, slots: &[NewBookingSlot]) -> Result<Vec<BookingSlot>, GatewayError>;

    /// Fetches a slot by ID.
    ///
    /// # Errors
    ///
    /// [`GatewayError::SlotNotFound`] when absent.
    async fn slot_by_id(&self, id: SlotId) -> Result<BookingSlot, GatewayError>;

    /// All slots in a group, ordered by start time.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn slots_for_group(&self, group: GroupId) -> Result<Vec<BookingSlot>, GatewayError>;

    /// One TA's slots in a group, ordered by start time.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn slots_for_ta(&self, group: GroupId, ta: TaId)
    -> Result<Vec<BookingSlot>, GatewayError>;

    /// Slots in a group starting at or after `from`, ordered by start time.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn slots_starting_after(
        &self,
        group: GroupId,
        from: DateTime<Utc>,
    ) -> Result<Vec<BookingSlot>, GatewayError>;

    /// Deletes a slot, cascading to its bookings. With `owner` set, only a
    /// row owned by that TA is touched. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn delete_slot(&self, id: SlotId, owner: Option<TaId>) -> Result<bool, GatewayError>;

    /// Booking counts for a set of slots in one round trip. Slots with no
    /// bookings are absent from the map.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn count_bookings_for_slots(
        &self,
        slot_ids: &[SlotId],
    ) -> Result<HashMap<SlotId, u32>, GatewayError>;

    /// Invokes the atomic booking procedure.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on transport failure or a
    /// malformed procedure response; rejections are [`BookingOutcome`]
    /// values, not errors.
    async fn create_booking_atomic(
        &self,
        slot: SlotId,
        group: GroupId,
        student: StudentId,
    ) -> Result<BookingOutcome, GatewayError>;

    /// Invokes the atomic cancellation procedure.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on transport failure or a
    /// malformed procedure response.
    async fn cancel_booking_atomic(
        &self,
        booking: BookingId,
        student: StudentId,
    ) -> Result<CancelOutcome, GatewayError>;

    /// Fetches a booking by ID.
    ///
    /// # Errors
    ///
    /// [`GatewayError::BookingNotFound`] when absent.
    async fn booking_by_id(&self, id: BookingId) -> Result<Booking, GatewayError>;

    /// All bookings in a group joined with their students, newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn bookings_for_group(&self, group: GroupId)
    -> Result<Vec<StudentBooking>, GatewayError>;

    /// Bookings on the given slots joined with their students.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn bookings_for_slots(
        &self,
        slot_ids: &[SlotId],
    ) -> Result<Vec<StudentBooking>, GatewayError>;

    /// A student's bookings joined with the slots they claim, newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn bookings_for_student(
        &self,
        student: StudentId,
    ) -> Result<Vec<(Booking, BookingSlot)>, GatewayError>;

    /// Deletes a booking directly (administrator surface; frees the seat
    /// without going through the cancellation procedure). Returns whether
    /// a row was deleted.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn delete_booking(&self, id: BookingId) -> Result<bool, GatewayError>;

    /// All known TAs, ordered by name.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    async fn list_tas(&self) -> Result<Vec<TeachingAssistant>, GatewayError>;
}
