//! Booking service: orchestrates slot planning, availability, and the
//! delegated atomic booking operations.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::availability::{self, RequirementProgress};
use crate::domain::booking_group::{BookingGroup, GroupSpec};
use crate::domain::schedule::{self, MinuteSpan};
use crate::domain::slot::{BookingSlot, NewBookingSlot};
use crate::domain::timezone;
use crate::domain::{Booking, BookingId, GroupAction, GroupId, GroupStatus, SlotId, StudentId, TaId};
use crate::error::GatewayError;
use crate::persistence::models::{StudentBooking, TeachingAssistant};
use crate::persistence::{BookingOutcome, BookingStore, CancelOutcome};

/// Input for planning or creating a slot batch.
#[derive(Debug, Clone)]
pub struct SlotBatchSpec {
    /// TA the slots will belong to.
    pub ta_id: TaId,
    /// Calendar date the batch lands on, local to the caller.
    pub date: NaiveDate,
    /// Wall-clock start of the range.
    pub start_time: NaiveTime,
    /// Wall-clock end of the range.
    pub end_time: NaiveTime,
    /// Length of each slot in minutes.
    pub slot_duration_minutes: u32,
    /// Seats per slot.
    pub capacity: u32,
    /// Caller's UTC offset in minutes east of UTC.
    pub utc_offset_minutes: i32,
}

/// A slot together with its current booking count.
///
/// The count is a display-time prediction; the atomic booking procedure
/// remains the authority at submission time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotOccupancy {
    /// The slot.
    pub slot: BookingSlot,
    /// Bookings currently counted against it.
    pub booked: u32,
    /// Seats remaining.
    pub spots_left: u32,
}

/// A TA's slot with the students booked into it (empty unless the group's
/// status lets TAs see bookings).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotWithBookings {
    /// The slot.
    pub slot: BookingSlot,
    /// Students booked into it.
    pub bookings: Vec<StudentBooking>,
}

/// Everything a TA's slot page needs for one group.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaSlotBoard {
    /// The group.
    pub group: BookingGroup,
    /// The TA's progress toward the group's hour requirement.
    pub progress: RequirementProgress,
    /// The TA's slots, with bookings where visible.
    pub slots: Vec<SlotWithBookings>,
}

/// One TA's standing in the admin fulfillment report.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaFulfillment {
    /// The TA.
    pub ta: TeachingAssistant,
    /// Their progress toward the requirement.
    pub progress: RequirementProgress,
}

/// A student's booking joined with the slot it claims.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingWithSlot {
    /// The booking.
    pub booking: Booking,
    /// The claimed slot.
    pub slot: BookingSlot,
}

/// Preview of a slot batch before anything is persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotPlanPreview {
    /// Number of slots the batch would create.
    pub slot_count: usize,
    /// Length of each slot in minutes.
    pub slot_duration_minutes: u32,
    /// Total committed minutes across the batch.
    pub total_minutes: u32,
}

/// Orchestration layer for all booking operations.
///
/// Stateless coordinator over a [`BookingStore`]. Mutations follow the
/// pattern: fetch → gate on status → pure domain computation → persist →
/// trace. Slot batches are validated completely before the single insert,
/// so no partial batch ever reaches the store. A concurrent insert by the
/// same TA between the validation snapshot and the insert is not detected
/// here; the window is accepted as-is.
#[derive(Debug, Clone)]
pub struct BookingService {
    store: Arc<dyn BookingStore>,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    fn gate(group: &BookingGroup, action: GroupAction) -> Result<(), GatewayError> {
        if group.status.allows(action) {
            Ok(())
        } else {
            Err(GatewayError::ActionNotAllowed {
                status: group.status,
                action,
            })
        }
    }

    /// Creates a booking group after validating its invariants.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] on a violated invariant or slug
    /// collision.
    pub async fn create_group(&self, spec: GroupSpec) -> Result<BookingGroup, GatewayError> {
        spec.validate()?;
        let group = self.store.insert_group(&spec).await?;
        tracing::info!(group_id = %group.id, slug = %group.slug, "booking group created");
        Ok(group)
    }

    /// Fetches a group by ID.
    ///
    /// # Errors
    ///
    /// [`GatewayError::GroupNotFound`] when absent.
    pub async fn group(&self, id: GroupId) -> Result<BookingGroup, GatewayError> {
        self.store.group_by_id(id).await
    }

    /// Fetches a group by slug.
    ///
    /// # Errors
    ///
    /// [`GatewayError::SlugNotFound`] when absent.
    pub async fn group_by_slug(&self, slug: &str) -> Result<BookingGroup, GatewayError> {
        self.store.group_by_slug(slug).await
    }

    /// Lists groups restricted to `statuses` (empty means all).
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    pub async fn list_groups(
        &self,
        statuses: &[GroupStatus],
    ) -> Result<Vec<BookingGroup>, GatewayError> {
        self.store.list_groups(statuses).await
    }

    /// Moves a group to a new lifecycle status, enforcing the forward-only
    /// transition set.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidTransition`] for an illegal move;
    /// [`GatewayError::GroupNotFound`] when absent.
    pub async fn change_status(
        &self,
        id: GroupId,
        next: GroupStatus,
    ) -> Result<BookingGroup, GatewayError> {
        let mut group = self.store.group_by_id(id).await?;
        if !group.status.can_transition_to(next) {
            return Err(GatewayError::InvalidTransition {
                from: group.status,
                to: next,
            });
        }
        self.store.update_group_status(id, next).await?;
        tracing::info!(group_id = %id, from = %group.status, to = %next, "group status changed");
        group.status = next;
        Ok(group)
    }

    /// Computes the slot count a batch would produce, without touching any
    /// slot data. Runs the same range, window, and divisibility checks as
    /// creation; overlap is only checked at creation time.
    ///
    /// # Errors
    ///
    /// [`GatewayError::GroupNotFound`] or a [`GatewayError::Plan`]
    /// validation failure.
    pub async fn preview_slots(
        &self,
        group_id: GroupId,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        slot_duration_minutes: u32,
    ) -> Result<SlotPlanPreview, GatewayError> {
        let group = self.store.group_by_id(group_id).await?;
        let range = MinuteSpan::from_times(start_time, end_time);
        let plan = schedule::plan_slots(
            date,
            range,
            slot_duration_minutes,
            1,
            group.daily_window(),
            &[],
        )?;
        Ok(SlotPlanPreview {
            slot_count: plan.slot_count(),
            slot_duration_minutes,
            total_minutes: plan.total_minutes(),
        })
    }

    /// Plans and persists a slot batch for one TA and date.
    ///
    /// Validation runs against a snapshot of the TA's existing slots,
    /// projected into the caller's UTC offset; only a fully valid batch is
    /// inserted, in a single statement.
    ///
    /// # Errors
    ///
    /// Gate, range, and plan failures as described on
    /// [`schedule::plan_slots`]; [`GatewayError::ActionNotAllowed`] unless
    /// the group is still hidden.
    pub async fn create_slots(
        &self,
        group_id: GroupId,
        spec: &SlotBatchSpec,
    ) -> Result<Vec<BookingSlot>, GatewayError> {
        let group = self.store.group_by_id(group_id).await?;
        Self::gate(&group, GroupAction::TaAddSlot)?;

        if spec.capacity == 0 {
            return Err(GatewayError::InvalidRequest(
                "capacity must be at least 1".to_string(),
            ));
        }
        if !group.date_in_range(spec.date) {
            return Err(GatewayError::InvalidRequest(format!(
                "date {} is outside the group's booking range",
                spec.date
            )));
        }

        let offset = timezone::offset_from_minutes(spec.utc_offset_minutes)?;
        let range = MinuteSpan::from_times(spec.start_time, spec.end_time);

        let existing = self.store.slots_for_ta(group_id, spec.ta_id).await?;
        let existing_spans: Vec<MinuteSpan> = existing
            .iter()
            .map(|slot| slot.wall_span(offset))
            .filter(|(date, _)| *date == spec.date)
            .map(|(_, span)| span)
            .collect();

        let plan = schedule::plan_slots(
            spec.date,
            range,
            spec.slot_duration_minutes,
            spec.capacity,
            group.daily_window(),
            &existing_spans,
        )?;
        let rows = NewBookingSlot::from_plan(&plan, group_id, spec.ta_id, offset)?;
        let created = self.store.insert_slots(&rows).await?;

        tracing::info!(
            group_id = %group_id,
            ta_id = %spec.ta_id,
            date = %spec.date,
            count = created.len(),
            "slot batch created"
        );
        Ok(created)
    }

    /// Deletes one of the TA's own slots while the group is still hidden.
    ///
    /// # Errors
    ///
    /// [`GatewayError::SlotNotFound`] when the slot does not exist or is
    /// not owned by `ta`; [`GatewayError::ActionNotAllowed`] once the
    /// group has left `hidden`.
    pub async fn delete_slot_as_ta(&self, slot_id: SlotId, ta: TaId) -> Result<(), GatewayError> {
        let slot = self.store.slot_by_id(slot_id).await?;
        let group = self.store.group_by_id(slot.booking_group_id).await?;
        Self::gate(&group, GroupAction::TaAddSlot)?;

        if !self.store.delete_slot(slot_id, Some(ta)).await? {
            return Err(GatewayError::SlotNotFound(*slot_id.as_uuid()));
        }
        tracing::info!(slot_id = %slot_id, ta_id = %ta, "slot deleted by ta");
        Ok(())
    }

    /// Deletes any slot regardless of group status, cascading to its
    /// bookings (administrator surface).
    ///
    /// # Errors
    ///
    /// [`GatewayError::SlotNotFound`] when absent.
    pub async fn delete_slot_as_admin(&self, slot_id: SlotId) -> Result<(), GatewayError> {
        if !self.store.delete_slot(slot_id, None).await? {
            return Err(GatewayError::SlotNotFound(*slot_id.as_uuid()));
        }
        tracing::info!(slot_id = %slot_id, "slot deleted by admin");
        Ok(())
    }

    /// All slots in a group with their booking counts, for the admin
    /// overview. Counts come from one batched query.
    ///
    /// # Errors
    ///
    /// [`GatewayError::GroupNotFound`] or a persistence failure.
    pub async fn slot_occupancy(&self, group_id: GroupId) -> Result<Vec<SlotOccupancy>, GatewayError> {
        let _ = self.store.group_by_id(group_id).await?;
        let slots = self.store.slots_for_group(group_id).await?;
        self.attach_counts(slots).await
    }

    /// Bookable slots a student can still claim: future slots with seats
    /// remaining, in a published group.
    ///
    /// The result is a prediction — counts are not snapshot-consistent
    /// with concurrent bookings, and the atomic procedure makes the final
    /// call at submission time.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ActionNotAllowed`] unless the group is published;
    /// [`GatewayError::GroupNotFound`] or a persistence failure.
    pub async fn available_slots(
        &self,
        group_id: GroupId,
        from: DateTime<Utc>,
    ) -> Result<Vec<SlotOccupancy>, GatewayError> {
        let group = self.store.group_by_id(group_id).await?;
        Self::gate(&group, GroupAction::StudentBook)?;

        let slots = self.store.slots_starting_after(group_id, from).await?;
        let occupancy = self.attach_counts(slots).await?;
        Ok(occupancy
            .into_iter()
            .filter(|o| availability::has_availability(o.booked, o.slot.capacity))
            .collect())
    }

    async fn attach_counts(
        &self,
        slots: Vec<BookingSlot>,
    ) -> Result<Vec<SlotOccupancy>, GatewayError> {
        let ids: Vec<SlotId> = slots.iter().map(|s| s.id).collect();
        let counts = self.store.count_bookings_for_slots(&ids).await?;
        Ok(slots
            .into_iter()
            .map(|slot| {
                let booked = counts.get(&slot.id).copied().unwrap_or(0);
                let spots_left = availability::spots_left(booked, slot.capacity);
                SlotOccupancy {
                    slot,
                    booked,
                    spots_left,
                }
            })
            .collect())
    }

    /// A TA's slot page for one group: their slots, hour-requirement
    /// progress, and — once the group's status allows it — the students
    /// booked into each slot.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ActionNotAllowed`] for an inactive group;
    /// [`GatewayError::GroupNotFound`] or a persistence failure.
    pub async fn ta_slot_board(
        &self,
        group_id: GroupId,
        ta: TaId,
    ) -> Result<TaSlotBoard, GatewayError> {
        let group = self.store.group_by_id(group_id).await?;
        if !group.status.accessible_to_tas() {
            return Err(GatewayError::ActionNotAllowed {
                status: group.status,
                action: GroupAction::TaViewBookings,
            });
        }

        let slots = self.store.slots_for_ta(group_id, ta).await?;
        let progress = RequirementProgress::assess(&slots, group.ta_required_minutes);

        let mut bookings = if group.status.allows(GroupAction::TaViewBookings) {
            let ids: Vec<SlotId> = slots.iter().map(|s| s.id).collect();
            self.store.bookings_for_slots(&ids).await?
        } else {
            Vec::new()
        };

        let slots = slots
            .into_iter()
            .map(|slot| {
                let (mine, rest): (Vec<_>, Vec<_>) = bookings
                    .drain(..)
                    .partition(|b| b.booking.booking_slot_id == slot.id);
                bookings = rest;
                SlotWithBookings {
                    slot,
                    bookings: mine,
                }
            })
            .collect();

        Ok(TaSlotBoard {
            group,
            progress,
            slots,
        })
    }

    /// The admin fulfillment report: every known TA's committed minutes in
    /// this group against the requirement, zero-slot TAs included.
    ///
    /// # Errors
    ///
    /// [`GatewayError::GroupNotFound`] or a persistence failure.
    pub async fn group_fulfillment(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<TaFulfillment>, GatewayError> {
        let group = self.store.group_by_id(group_id).await?;
        let slots = self.store.slots_for_group(group_id).await?;
        let tas = self.store.list_tas().await?;

        Ok(tas
            .into_iter()
            .map(|ta| {
                let theirs: Vec<BookingSlot> = slots
                    .iter()
                    .filter(|s| s.ta_id == Some(ta.id))
                    .cloned()
                    .collect();
                let progress = RequirementProgress::assess(&theirs, group.ta_required_minutes);
                TaFulfillment { ta, progress }
            })
            .collect())
    }

    /// All bookings in a group with their students (administrator view).
    ///
    /// # Errors
    ///
    /// [`GatewayError::GroupNotFound`] or a persistence failure.
    pub async fn group_bookings(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<StudentBooking>, GatewayError> {
        let _ = self.store.group_by_id(group_id).await?;
        self.store.bookings_for_group(group_id).await
    }

    /// Books a slot for a student through the atomic procedure.
    ///
    /// The procedure is authoritative; a rejection here means the
    /// student's view was stale and the returned error names what to
    /// re-fetch. Never retried.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ActionNotAllowed`] unless the group is published;
    /// [`GatewayError::AlreadyBooked`], [`GatewayError::SlotFull`], or
    /// [`GatewayError::BookingRejected`] when the procedure declines.
    pub async fn book_slot(
        &self,
        slot_id: SlotId,
        group_id: GroupId,
        student: StudentId,
    ) -> Result<BookingId, GatewayError> {
        let group = self.store.group_by_id(group_id).await?;
        Self::gate(&group, GroupAction::StudentBook)?;

        match self
            .store
            .create_booking_atomic(slot_id, group_id, student)
            .await?
        {
            BookingOutcome::Confirmed(booking_id) => {
                tracing::info!(
                    booking_id = %booking_id,
                    slot_id = %slot_id,
                    group_id = %group_id,
                    "booking confirmed"
                );
                Ok(booking_id)
            }
            BookingOutcome::AlreadyBooked { message } => Err(GatewayError::AlreadyBooked {
                message,
                group_id: *group_id.as_uuid(),
            }),
            BookingOutcome::SlotFull { message } => Err(GatewayError::SlotFull {
                message,
                slot_id: *slot_id.as_uuid(),
            }),
            BookingOutcome::Rejected { message } => Err(GatewayError::BookingRejected(message)),
        }
    }

    /// Cancels a student's booking through the atomic procedure. Only
    /// allowed while the group is published; a locked group keeps its
    /// bookings frozen.
    ///
    /// # Errors
    ///
    /// [`GatewayError::ActionNotAllowed`], [`GatewayError::BookingNotFound`],
    /// or [`GatewayError::BookingRejected`].
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        student: StudentId,
    ) -> Result<(), GatewayError> {
        let booking = self.store.booking_by_id(booking_id).await?;
        let group = self.store.group_by_id(booking.booking_group_id).await?;
        Self::gate(&group, GroupAction::StudentCancel)?;

        match self.store.cancel_booking_atomic(booking_id, student).await? {
            CancelOutcome::Cancelled => {
                tracing::info!(booking_id = %booking_id, "booking cancelled");
                Ok(())
            }
            CancelOutcome::NotFound { .. } => {
                Err(GatewayError::BookingNotFound(*booking_id.as_uuid()))
            }
            CancelOutcome::Rejected { message } => Err(GatewayError::BookingRejected(message)),
        }
    }

    /// A student's bookings with the slots they claim, newest first.
    ///
    /// # Errors
    ///
    /// [`GatewayError::PersistenceError`] on database failure.
    pub async fn student_bookings(
        &self,
        student: StudentId,
    ) -> Result<Vec<BookingWithSlot>, GatewayError> {
        let rows = self.store.bookings_for_student(student).await?;
        Ok(rows
            .into_iter()
            .map(|(booking, slot)| BookingWithSlot { booking, slot })
            .collect())
    }

    /// Deletes a booking directly, freeing the seat so the student can
    /// rebook (administrator surface).
    ///
    /// # Errors
    ///
    /// [`GatewayError::BookingNotFound`] when absent.
    pub async fn delete_booking_as_admin(&self, booking_id: BookingId) -> Result<(), GatewayError> {
        if !self.store.delete_booking(booking_id).await? {
            return Err(GatewayError::BookingNotFound(*booking_id.as_uuid()));
        }
        tracing::info!(booking_id = %booking_id, "booking deleted by admin");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveTime;

    use super::*;
    use crate::domain::booking_group::GroupSpec;
    use crate::domain::PlanError;
    use crate::persistence::models::Student;

    /// In-memory [`BookingStore`] mirroring the database semantics closely
    /// enough to drive the service: slug uniqueness, one booking per
    /// student per group, and capacity enforcement inside the atomic call.
    #[derive(Debug, Default)]
    struct InMemoryStore {
        inner: Mutex<State>,
    }

    #[derive(Debug, Default)]
    struct State {
        groups: Vec<BookingGroup>,
        slots: Vec<BookingSlot>,
        bookings: Vec<Booking>,
        tas: Vec<TeachingAssistant>,
    }

    impl InMemoryStore {
        fn lock(&self) -> std::sync::MutexGuard<'_, State> {
            self.inner
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        fn slot_count(&self) -> usize {
            self.lock().slots.len()
        }

        fn push_ta(&self, ta: TeachingAssistant) {
            self.lock().tas.push(ta);
        }
    }

    #[async_trait]
    impl BookingStore for InMemoryStore {
        async fn insert_group(&self, spec: &GroupSpec) -> Result<BookingGroup, GatewayError> {
            let mut state = self.lock();
            if state.groups.iter().any(|g| g.slug == spec.slug) {
                return Err(GatewayError::InvalidRequest(format!(
                    "a booking group with slug {:?} already exists",
                    spec.slug
                )));
            }
            let group = BookingGroup {
                id: GroupId::new(),
                slug: spec.slug.clone(),
                name: spec.name.clone(),
                description: spec.description.clone(),
                status: spec.status,
                ta_required_minutes: spec.ta_required_minutes,
                date_range_start: spec.date_range_start,
                date_range_end: spec.date_range_end,
                daily_start_time: spec.daily_start_time,
                daily_end_time: spec.daily_end_time,
                created_at: Utc::now(),
            };
            state.groups.push(group.clone());
            Ok(group)
        }

        async fn group_by_id(&self, id: GroupId) -> Result<BookingGroup, GatewayError> {
            self.lock()
                .groups
                .iter()
                .find(|g| g.id == id)
                .cloned()
                .ok_or(GatewayError::GroupNotFound(*id.as_uuid()))
        }

        async fn group_by_slug(&self, slug: &str) -> Result<BookingGroup, GatewayError> {
            self.lock()
                .groups
                .iter()
                .find(|g| g.slug == slug)
                .cloned()
                .ok_or_else(|| GatewayError::SlugNotFound(slug.to_string()))
        }

        async fn list_groups(
            &self,
            statuses: &[GroupStatus],
        ) -> Result<Vec<BookingGroup>, GatewayError> {
            Ok(self
                .lock()
                .groups
                .iter()
                .filter(|g| statuses.is_empty() || statuses.contains(&g.status))
                .cloned()
                .collect())
        }

        async fn update_group_status(
            &self,
            id: GroupId,
            status: GroupStatus,
        ) -> Result<(), GatewayError> {
            let mut state = self.lock();
            let group = state
                .groups
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or(GatewayError::GroupNotFound(*id.as_uuid()))?;
            group.status = status;
            Ok(())
        }

        async fn insert_slots(
            &self,
            slots: &[NewBookingSlot],
        ) -> Result<Vec<BookingSlot>, GatewayError> {
            let mut state = self.lock();
            let mut created = Vec::with_capacity(slots.len());
            for row in slots {
                let slot = BookingSlot {
                    id: SlotId::new(),
                    booking_group_id: row.booking_group_id,
                    ta_id: Some(row.ta_id),
                    start_time: row.start_time,
                    end_time: row.end_time,
                    capacity: row.capacity,
                    created_at: Utc::now(),
                };
                state.slots.push(slot.clone());
                created.push(slot);
            }
            Ok(created)
        }

        async fn slot_by_id(&self, id: SlotId) -> Result<BookingSlot, GatewayError> {
            self.lock()
                .slots
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or(GatewayError::SlotNotFound(*id.as_uuid()))
        }

        async fn slots_for_group(&self, group: GroupId) -> Result<Vec<BookingSlot>, GatewayError> {
            Ok(self
                .lock()
                .slots
                .iter()
                .filter(|s| s.booking_group_id == group)
                .cloned()
                .collect())
        }

        async fn slots_for_ta(
            &self,
            group: GroupId,
            ta: TaId,
        ) -> Result<Vec<BookingSlot>, GatewayError> {
            Ok(self
                .lock()
                .slots
                .iter()
                .filter(|s| s.booking_group_id == group && s.ta_id == Some(ta))
                .cloned()
                .collect())
        }

        async fn slots_starting_after(
            &self,
            group: GroupId,
            from: DateTime<Utc>,
        ) -> Result<Vec<BookingSlot>, GatewayError> {
            Ok(self
                .lock()
                .slots
                .iter()
                .filter(|s| s.booking_group_id == group && s.start_time >= from)
                .cloned()
                .collect())
        }

        async fn delete_slot(&self, id: SlotId, owner: Option<TaId>) -> Result<bool, GatewayError> {
            let mut state = self.lock();
            let before = state.slots.len();
            state
                .slots
                .retain(|s| !(s.id == id && owner.is_none_or(|ta| s.ta_id == Some(ta))));
            let deleted = state.slots.len() < before;
            if deleted {
                state.bookings.retain(|b| b.booking_slot_id != id);
            }
            Ok(deleted)
        }

        async fn count_bookings_for_slots(
            &self,
            slot_ids: &[SlotId],
        ) -> Result<HashMap<SlotId, u32>, GatewayError> {
            let state = self.lock();
            let mut counts = HashMap::new();
            for booking in &state.bookings {
                if slot_ids.contains(&booking.booking_slot_id) {
                    *counts.entry(booking.booking_slot_id).or_insert(0u32) += 1;
                }
            }
            Ok(counts)
        }

        async fn create_booking_atomic(
            &self,
            slot: SlotId,
            group: GroupId,
            student: StudentId,
        ) -> Result<BookingOutcome, GatewayError> {
            let mut state = self.lock();
            if state
                .bookings
                .iter()
                .any(|b| b.booking_group_id == group && b.student_id == student)
            {
                return Ok(BookingOutcome::AlreadyBooked {
                    message: "You already have a booking for this demo".to_string(),
                });
            }
            let Some(capacity) = state
                .slots
                .iter()
                .find(|s| s.id == slot)
                .map(|s| s.capacity)
            else {
                return Ok(BookingOutcome::Rejected {
                    message: "Slot does not exist".to_string(),
                });
            };
            let booked = state
                .bookings
                .iter()
                .filter(|b| b.booking_slot_id == slot)
                .count();
            if booked >= capacity as usize {
                return Ok(BookingOutcome::SlotFull {
                    message: "This slot is full".to_string(),
                });
            }
            let booking = Booking {
                id: BookingId::new(),
                booking_slot_id: slot,
                booking_group_id: group,
                student_id: student,
                booked_at: Utc::now(),
            };
            let id = booking.id;
            state.bookings.push(booking);
            Ok(BookingOutcome::Confirmed(id))
        }

        async fn cancel_booking_atomic(
            &self,
            booking: BookingId,
            student: StudentId,
        ) -> Result<CancelOutcome, GatewayError> {
            let mut state = self.lock();
            let before = state.bookings.len();
            state
                .bookings
                .retain(|b| !(b.id == booking && b.student_id == student));
            if state.bookings.len() < before {
                Ok(CancelOutcome::Cancelled)
            } else {
                Ok(CancelOutcome::NotFound {
                    message: "No booking found".to_string(),
                })
            }
        }

        async fn booking_by_id(&self, id: BookingId) -> Result<Booking, GatewayError> {
            self.lock()
                .bookings
                .iter()
                .find(|b| b.id == id)
                .cloned()
                .ok_or(GatewayError::BookingNotFound(*id.as_uuid()))
        }

        async fn bookings_for_group(
            &self,
            group: GroupId,
        ) -> Result<Vec<StudentBooking>, GatewayError> {
            Ok(self
                .lock()
                .bookings
                .iter()
                .filter(|b| b.booking_group_id == group)
                .cloned()
                .map(placeholder_student_booking)
                .collect())
        }

        async fn bookings_for_slots(
            &self,
            slot_ids: &[SlotId],
        ) -> Result<Vec<StudentBooking>, GatewayError> {
            Ok(self
                .lock()
                .bookings
                .iter()
                .filter(|b| slot_ids.contains(&b.booking_slot_id))
                .cloned()
                .map(placeholder_student_booking)
                .collect())
        }

        async fn bookings_for_student(
            &self,
            student: StudentId,
        ) -> Result<Vec<(Booking, BookingSlot)>, GatewayError> {
            let state = self.lock();
            Ok(state
                .bookings
                .iter()
                .filter(|b| b.student_id == student)
                .filter_map(|b| {
                    state
                        .slots
                        .iter()
                        .find(|s| s.id == b.booking_slot_id)
                        .map(|s| (b.clone(), s.clone()))
                })
                .collect())
        }

        async fn delete_booking(&self, id: BookingId) -> Result<bool, GatewayError> {
            let mut state = self.lock();
            let before = state.bookings.len();
            state.bookings.retain(|b| b.id != id);
            Ok(state.bookings.len() < before)
        }

        async fn list_tas(&self) -> Result<Vec<TeachingAssistant>, GatewayError> {
            Ok(self.lock().tas.clone())
        }
    }

    fn placeholder_student_booking(booking: Booking) -> StudentBooking {
        let student_id = booking.student_id;
        StudentBooking {
            booking,
            student: Student {
                id: student_id,
                email: "student@example.edu".to_string(),
                name: "Student".to_string(),
                created_at: Utc::now(),
            },
        }
    }

    fn service() -> (BookingService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::default());
        (BookingService::new(Arc::clone(&store) as Arc<dyn BookingStore>), store)
    }

    fn group_spec(status: GroupStatus) -> GroupSpec {
        GroupSpec {
            name: "Week 5 Demo".to_string(),
            slug: "week-5-demo".to_string(),
            description: None,
            status,
            ta_required_minutes: 30,
            date_range_start: None,
            date_range_end: None,
            daily_start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            daily_end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        }
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
    }

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default()
    }

    fn batch(ta: TaId) -> SlotBatchSpec {
        SlotBatchSpec {
            ta_id: ta,
            date: march_first(),
            start_time: hm(9, 0),
            end_time: hm(9, 30),
            slot_duration_minutes: 15,
            capacity: 2,
            utc_offset_minutes: -300,
        }
    }

    async fn group_with_status(
        service: &BookingService,
        status: GroupStatus,
    ) -> BookingGroup {
        service
            .create_group(group_spec(status))
            .await
            .ok()
            .unwrap_or_else(|| panic!("group creation failed"))
    }

    #[tokio::test]
    async fn creates_a_clean_slot_batch() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let ta = TaId::new();

        let created = service.create_slots(group.id, &batch(ta)).await;
        let Ok(created) = created else {
            panic!("batch should be created");
        };

        assert_eq!(created.len(), 2);
        assert_eq!(store.slot_count(), 2);
        // 09:00 at UTC-05:00 is 14:00 UTC.
        assert_eq!(
            created.first().map(|s| s.start_time.to_rfc3339()),
            Some("2024-03-01T14:00:00+00:00".to_string())
        );
        assert!(created.iter().all(|s| s.capacity == 2));
    }

    #[tokio::test]
    async fn slot_creation_is_gated_on_hidden() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Published).await;

        let err = service.create_slots(group.id, &batch(TaId::new())).await;
        assert!(matches!(
            err,
            Err(GatewayError::ActionNotAllowed {
                action: GroupAction::TaAddSlot,
                ..
            })
        ));
        assert_eq!(store.slot_count(), 0);
    }

    #[tokio::test]
    async fn overlap_rejects_the_batch_before_any_insert() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let ta = TaId::new();

        // Existing slot 09:10-09:20 local on the same date.
        let first = service
            .create_slots(
                group.id,
                &SlotBatchSpec {
                    start_time: hm(9, 10),
                    end_time: hm(9, 20),
                    slot_duration_minutes: 10,
                    ..batch(ta)
                },
            )
            .await;
        assert!(first.is_ok());
        assert_eq!(store.slot_count(), 1);

        let err = service.create_slots(group.id, &batch(ta)).await;
        assert!(matches!(err, Err(GatewayError::Plan(PlanError::Overlap { .. }))));
        // Nothing from the rejected batch landed.
        assert_eq!(store.slot_count(), 1);
    }

    #[tokio::test]
    async fn another_tas_slots_do_not_conflict() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;

        let first = service.create_slots(group.id, &batch(TaId::new())).await;
        assert!(first.is_ok());
        let second = service.create_slots(group.id, &batch(TaId::new())).await;
        assert!(second.is_ok());
        assert_eq!(store.slot_count(), 4);
    }

    #[tokio::test]
    async fn date_outside_group_range_is_rejected() {
        let (service, _) = service();
        let mut spec = group_spec(GroupStatus::Hidden);
        spec.date_range_start = NaiveDate::from_ymd_opt(2024, 4, 1);
        spec.date_range_end = NaiveDate::from_ymd_opt(2024, 4, 7);
        let group = service
            .create_group(spec)
            .await
            .ok()
            .unwrap_or_else(|| panic!("group creation failed"));

        let err = service.create_slots(group.id, &batch(TaId::new())).await;
        assert!(matches!(err, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn preview_counts_without_persisting() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;

        let preview = service
            .preview_slots(group.id, march_first(), hm(9, 0), hm(11, 0), 10)
            .await;
        let Ok(preview) = preview else {
            panic!("preview should succeed");
        };
        assert_eq!(preview.slot_count, 12);
        assert_eq!(preview.total_minutes, 120);
        assert_eq!(store.slot_count(), 0);

        let err = service
            .preview_slots(group.id, march_first(), hm(9, 0), hm(10, 50), 25)
            .await;
        assert!(matches!(
            err,
            Err(GatewayError::Plan(PlanError::IndivisibleDuration { remainder: 10, .. }))
        ));
    }

    #[tokio::test]
    async fn booking_maps_atomic_outcomes() {
        let (service, _) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let ta = TaId::new();
        let created = service
            .create_slots(
                group.id,
                &SlotBatchSpec {
                    capacity: 1,
                    ..batch(ta)
                },
            )
            .await
            .ok()
            .unwrap_or_default();
        let Some(slot) = created.first() else {
            panic!("expected a slot");
        };

        let group = service
            .change_status(group.id, GroupStatus::Published)
            .await
            .ok()
            .unwrap_or_else(|| panic!("publish failed"));

        let alice = StudentId::new();
        let bob = StudentId::new();

        assert!(service.book_slot(slot.id, group.id, alice).await.is_ok());

        // Capacity exhausted: the atomic rejection names the slot.
        let err = service.book_slot(slot.id, group.id, bob).await;
        match err {
            Err(GatewayError::SlotFull { slot_id, .. }) => {
                assert_eq!(slot_id, *slot.id.as_uuid());
            }
            other => panic!("expected SlotFull, got {other:?}"),
        }

        // Same student, another attempt in the same group.
        let err = service.book_slot(slot.id, group.id, alice).await;
        match err {
            Err(GatewayError::AlreadyBooked { group_id, .. }) => {
                assert_eq!(group_id, *group.id.as_uuid());
            }
            other => panic!("expected AlreadyBooked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn booking_is_gated_on_published() {
        let (service, _) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;

        let err = service
            .book_slot(SlotId::new(), group.id, StudentId::new())
            .await;
        assert!(matches!(
            err,
            Err(GatewayError::ActionNotAllowed {
                action: GroupAction::StudentBook,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn cancellation_freezes_with_the_group() {
        let (service, _) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let created = service
            .create_slots(group.id, &batch(TaId::new()))
            .await
            .ok()
            .unwrap_or_default();
        let Some(slot) = created.first() else {
            panic!("expected a slot");
        };
        let group = service
            .change_status(group.id, GroupStatus::Published)
            .await
            .ok()
            .unwrap_or_else(|| panic!("publish failed"));

        let student = StudentId::new();
        let booking_id = service
            .book_slot(slot.id, group.id, student)
            .await
            .ok()
            .unwrap_or_else(|| panic!("booking failed"));

        // Locked groups keep their bookings.
        let _ = service
            .change_status(group.id, GroupStatus::Locked)
            .await
            .ok()
            .unwrap_or_else(|| panic!("lock failed"));
        let err = service.cancel_booking(booking_id, student).await;
        assert!(matches!(
            err,
            Err(GatewayError::ActionNotAllowed {
                action: GroupAction::StudentCancel,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn cancellation_succeeds_while_published() {
        let (service, _) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let created = service
            .create_slots(group.id, &batch(TaId::new()))
            .await
            .ok()
            .unwrap_or_default();
        let Some(slot) = created.first() else {
            panic!("expected a slot");
        };
        let group = service
            .change_status(group.id, GroupStatus::Published)
            .await
            .ok()
            .unwrap_or_else(|| panic!("publish failed"));

        let student = StudentId::new();
        let booking_id = service
            .book_slot(slot.id, group.id, student)
            .await
            .ok()
            .unwrap_or_else(|| panic!("booking failed"));

        assert!(service.cancel_booking(booking_id, student).await.is_ok());
        // The seat is free again.
        assert!(service.book_slot(slot.id, group.id, student).await.is_ok());
    }

    #[tokio::test]
    async fn illegal_transitions_are_rejected() {
        let (service, _) = service();
        let group = group_with_status(&service, GroupStatus::Published).await;

        let err = service.change_status(group.id, GroupStatus::Hidden).await;
        assert!(matches!(err, Err(GatewayError::InvalidTransition { .. })));

        let group = service
            .change_status(group.id, GroupStatus::Inactive)
            .await
            .ok()
            .unwrap_or_else(|| panic!("deactivation failed"));
        assert_eq!(group.status, GroupStatus::Inactive);

        // Terminal.
        let err = service.change_status(group.id, GroupStatus::Published).await;
        assert!(matches!(err, Err(GatewayError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn availability_filters_full_slots() {
        let (service, _) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let created = service
            .create_slots(
                group.id,
                &SlotBatchSpec {
                    capacity: 1,
                    ..batch(TaId::new())
                },
            )
            .await
            .ok()
            .unwrap_or_default();
        let Some(first) = created.first() else {
            panic!("expected slots");
        };
        let group = service
            .change_status(group.id, GroupStatus::Published)
            .await
            .ok()
            .unwrap_or_else(|| panic!("publish failed"));

        let _ = service
            .book_slot(first.id, group.id, StudentId::new())
            .await
            .ok()
            .unwrap_or_else(|| panic!("booking failed"));

        let from = chrono::DateTime::<Utc>::MIN_UTC;
        let available = service
            .available_slots(group.id, from)
            .await
            .ok()
            .unwrap_or_default();
        assert_eq!(available.len(), 1);
        assert!(available.iter().all(|o| o.slot.id != first.id));
        assert!(available.iter().all(|o| o.spots_left == 1));
    }

    #[tokio::test]
    async fn fulfillment_reports_every_ta() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;

        let busy = TaId::new();
        let idle = TaId::new();
        store.push_ta(TeachingAssistant {
            id: busy,
            email: "busy@example.edu".to_string(),
            name: "Busy".to_string(),
            created_at: Utc::now(),
        });
        store.push_ta(TeachingAssistant {
            id: idle,
            email: "idle@example.edu".to_string(),
            name: "Idle".to_string(),
            created_at: Utc::now(),
        });

        let _ = service
            .create_slots(group.id, &batch(busy))
            .await
            .ok()
            .unwrap_or_else(|| panic!("batch failed"));

        let report = service
            .group_fulfillment(group.id)
            .await
            .ok()
            .unwrap_or_default();
        assert_eq!(report.len(), 2);

        let by_id: HashMap<TaId, &TaFulfillment> =
            report.iter().map(|f| (f.ta.id, f)).collect();
        let busy_report = by_id.get(&busy).unwrap_or_else(|| panic!("missing ta"));
        assert_eq!(busy_report.progress.total_minutes, 30);
        assert!(busy_report.progress.is_complete);

        let idle_report = by_id.get(&idle).unwrap_or_else(|| panic!("missing ta"));
        assert_eq!(idle_report.progress.total_minutes, 0);
        assert!(!idle_report.progress.is_complete);
    }

    #[tokio::test]
    async fn ta_board_attaches_bookings_only_when_visible() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let ta = TaId::new();
        let created = service
            .create_slots(group.id, &batch(ta))
            .await
            .ok()
            .unwrap_or_default();
        let Some(slot) = created.first() else {
            panic!("expected a slot");
        };

        // Hidden: slots visible, bookings not.
        let board = service
            .ta_slot_board(group.id, ta)
            .await
            .ok()
            .unwrap_or_else(|| panic!("board failed"));
        assert_eq!(board.slots.len(), 2);
        assert_eq!(board.progress.total_minutes, 30);
        assert!(board.slots.iter().all(|s| s.bookings.is_empty()));

        let group = service
            .change_status(group.id, GroupStatus::Published)
            .await
            .ok()
            .unwrap_or_else(|| panic!("publish failed"));
        let _ = service
            .book_slot(slot.id, group.id, StudentId::new())
            .await
            .ok()
            .unwrap_or_else(|| panic!("booking failed"));

        let board = service
            .ta_slot_board(group.id, ta)
            .await
            .ok()
            .unwrap_or_else(|| panic!("board failed"));
        let booked_slot = board
            .slots
            .iter()
            .find(|s| s.slot.id == slot.id)
            .unwrap_or_else(|| panic!("slot missing from board"));
        assert_eq!(booked_slot.bookings.len(), 1);

        // Inactive groups are off for TAs too.
        let _ = service
            .change_status(group.id, GroupStatus::Locked)
            .await
            .ok()
            .unwrap_or_else(|| panic!("lock failed"));
        let _ = service
            .change_status(group.id, GroupStatus::Inactive)
            .await
            .ok()
            .unwrap_or_else(|| panic!("deactivation failed"));
        assert!(service.ta_slot_board(group.id, ta).await.is_err());
        let _ = store;
    }

    #[tokio::test]
    async fn ta_deletes_only_their_own_slots_while_hidden() {
        let (service, store) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let owner = TaId::new();
        let created = service
            .create_slots(group.id, &batch(owner))
            .await
            .ok()
            .unwrap_or_default();
        let Some(slot) = created.first() else {
            panic!("expected a slot");
        };

        // Someone else's TA ID does not match the row.
        let err = service.delete_slot_as_ta(slot.id, TaId::new()).await;
        assert!(matches!(err, Err(GatewayError::SlotNotFound(_))));
        assert_eq!(store.slot_count(), 2);

        assert!(service.delete_slot_as_ta(slot.id, owner).await.is_ok());
        assert_eq!(store.slot_count(), 1);

        // Once published, even the owner cannot delete.
        let _ = service
            .change_status(group.id, GroupStatus::Published)
            .await
            .ok()
            .unwrap_or_else(|| panic!("publish failed"));
        let Some(remaining) = created.get(1) else {
            panic!("expected a second slot");
        };
        let err = service.delete_slot_as_ta(remaining.id, owner).await;
        assert!(matches!(err, Err(GatewayError::ActionNotAllowed { .. })));

        // The admin path still works.
        assert!(service.delete_slot_as_admin(remaining.id).await.is_ok());
        assert_eq!(store.slot_count(), 0);
    }

    #[tokio::test]
    async fn student_bookings_join_their_slots() {
        let (service, _) = service();
        let group = group_with_status(&service, GroupStatus::Hidden).await;
        let created = service
            .create_slots(group.id, &batch(TaId::new()))
            .await
            .ok()
            .unwrap_or_default();
        let Some(slot) = created.first() else {
            panic!("expected a slot");
        };
        let group = service
            .change_status(group.id, GroupStatus::Published)
            .await
            .ok()
            .unwrap_or_else(|| panic!("publish failed"));

        let student = StudentId::new();
        let _ = service
            .book_slot(slot.id, group.id, student)
            .await
            .ok()
            .unwrap_or_else(|| panic!("booking failed"));

        let bookings = service
            .student_bookings(student)
            .await
            .ok()
            .unwrap_or_default();
        assert_eq!(bookings.len(), 1);
        assert_eq!(
            bookings.first().map(|b| b.slot.id),
            Some(slot.id)
        );
    }
}
