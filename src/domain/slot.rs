//! Bookable slot entities.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::schedule::{MinuteSpan, SlotPlan};
use super::timezone::{self, TimezoneError};
use super::{GroupId, SlotId, TaId};

/// A single bookable time interval owned by one TA within one booking
/// group. Times are absolute instants; the wall clock they were entered
/// in is recoverable only through an offset (see [`BookingSlot::wall_span`]).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingSlot {
    /// Unique slot identifier.
    pub id: SlotId,
    /// Group this slot belongs to.
    pub booking_group_id: GroupId,
    /// Owning TA, if any.
    pub ta_id: Option<TaId>,
    /// Absolute start instant.
    pub start_time: DateTime<Utc>,
    /// Absolute end instant; always after `start_time`.
    pub end_time: DateTime<Utc>,
    /// Maximum simultaneous bookings this slot accepts.
    pub capacity: u32,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BookingSlot {
    /// Committed minutes between start and end.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    /// Projects the slot onto the wall clock of `offset`: its local date
    /// and half-open minute span. The end is derived from the duration so
    /// the span never wraps at midnight.
    #[must_use]
    pub fn wall_span(&self, offset: FixedOffset) -> (NaiveDate, MinuteSpan) {
        let (date, start) = timezone::wall_clock_in(self.start_time, offset);
        let duration = u32::try_from(self.duration_minutes().max(0)).unwrap_or(0);
        (date, MinuteSpan::new(start, start + duration))
    }
}

/// Row data for bulk slot insertion; instants already normalized to UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookingSlot {
    /// Group the slot belongs to.
    pub booking_group_id: GroupId,
    /// Owning TA.
    pub ta_id: TaId,
    /// Absolute start instant.
    pub start_time: DateTime<Utc>,
    /// Absolute end instant.
    pub end_time: DateTime<Utc>,
    /// Seats on the slot.
    pub capacity: u32,
}

impl NewBookingSlot {
    /// Materializes a validated [`SlotPlan`] into insertable rows, stamping
    /// each span with the creator's UTC offset.
    ///
    /// # Errors
    ///
    /// [`TimezoneError`] if a span cannot be resolved against the offset
    /// (calendar bounds).
    pub fn from_plan(
        plan: &SlotPlan,
        group: GroupId,
        ta: TaId,
        offset: FixedOffset,
    ) -> Result<Vec<Self>, TimezoneError> {
        let mut rows = Vec::with_capacity(plan.spans.len());
        for span in &plan.spans {
            let start = timezone::resolve_instant(plan.date, span.start, offset)?;
            let end = timezone::resolve_instant(plan.date, span.end, offset)?;
            rows.push(Self {
                booking_group_id: group,
                ta_id: ta,
                start_time: start.with_timezone(&Utc),
                end_time: end.with_timezone(&Utc),
                capacity: plan.capacity,
            });
        }
        Ok(rows)
    }
}
