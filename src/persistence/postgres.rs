//! PostgreSQL implementation of the store port.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{Student, StudentBooking, TeachingAssistant};
use super::store::{BookingOutcome, BookingStore, CancelOutcome};
use crate::domain::booking::Booking;
use crate::domain::booking_group::{BookingGroup, GroupSpec};
use crate::domain::slot::{BookingSlot, NewBookingSlot};
use crate::domain::{BookingId, GroupId, GroupStatus, SlotId, StudentId, TaId};
use crate::error::GatewayError;

/// Raw booking-group row.
type GroupRow = (
    Uuid,
    String,
    String,
    Option<String>,
    GroupStatus,
    i32,
    Option<NaiveDate>,
    Option<NaiveDate>,
    NaiveTime,
    NaiveTime,
    DateTime<Utc>,
);

/// Raw booking-slot row.
type SlotRow = (
    Uuid,
    Uuid,
    Option<Uuid>,
    DateTime<Utc>,
    DateTime<Utc>,
    i32,
    DateTime<Utc>,
);

/// Raw booking row.
type BookingRow = (Uuid, Uuid, Uuid, Uuid, DateTime<Utc>);

const GROUP_COLUMNS: &str = "id, slug, name, description, status, ta_required_minutes, \
     date_range_start, date_range_end, daily_start_time, daily_end_time, created_at";

const SLOT_COLUMNS: &str =
    "id, booking_group_id, ta_id, start_time, end_time, capacity, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn persistence_error(e: sqlx::Error) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

fn group_from_row(row: GroupRow) -> BookingGroup {
    let (
        id,
        slug,
        name,
        description,
        status,
        ta_required_minutes,
        date_range_start,
        date_range_end,
        daily_start_time,
        daily_end_time,
        created_at,
    ) = row;
    BookingGroup {
        id: GroupId::from_uuid(id),
        slug,
        name,
        description,
        status,
        ta_required_minutes: u32::try_from(ta_required_minutes.max(0)).unwrap_or(0),
        date_range_start,
        date_range_end,
        daily_start_time,
        daily_end_time,
        created_at,
    }
}

fn slot_from_row(row: SlotRow) -> BookingSlot {
    let (id, group_id, ta_id, start_time, end_time, capacity, created_at) = row;
    BookingSlot {
        id: SlotId::from_uuid(id),
        booking_group_id: GroupId::from_uuid(group_id),
        ta_id: ta_id.map(TaId::from_uuid),
        start_time,
        end_time,
        capacity: u32::try_from(capacity.max(0)).unwrap_or(0),
        created_at,
    }
}

fn booking_from_row(row: BookingRow) -> Booking {
    let (id, slot_id, group_id, student_id, booked_at) = row;
    Booking {
        id: BookingId::from_uuid(id),
        booking_slot_id: SlotId::from_uuid(slot_id),
        booking_group_id: GroupId::from_uuid(group_id),
        student_id: StudentId::from_uuid(student_id),
        booked_at,
    }
}

fn malformed(procedure: &str) -> GatewayError {
    GatewayError::PersistenceError(format!("malformed response from {procedure}"))
}

/// Parses the `jsonb {success, error?, message, booking_id?}` payload of
/// `create_booking_atomic`.
fn parse_booking_outcome(value: &serde_json::Value) -> Result<BookingOutcome, GatewayError> {
    let success = value
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| malformed("create_booking_atomic"))?;
    let message = value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    if success {
        let booking_id = value
            .get("booking_id")
            .and_then(serde_json::Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| malformed("create_booking_atomic"))?;
        return Ok(BookingOutcome::Confirmed(BookingId::from_uuid(booking_id)));
    }

    match value.get("error").and_then(serde_json::Value::as_str) {
        Some("ALREADY_BOOKED") => Ok(BookingOutcome::AlreadyBooked { message }),
        Some("SLOT_FULL") => Ok(BookingOutcome::SlotFull { message }),
        _ => Ok(BookingOutcome::Rejected { message }),
    }
}

/// Parses the `jsonb {success, error?, message}` payload of
/// `cancel_booking_atomic`.
fn parse_cancel_outcome(value: &serde_json::Value) -> Result<CancelOutcome, GatewayError> {
    let success = value
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .ok_or_else(|| malformed("cancel_booking_atomic"))?;
    let message = value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default()
        .to_string();

    if success {
        return Ok(CancelOutcome::Cancelled);
    }
    match value.get("error").and_then(serde_json::Value::as_str) {
        Some("NOT_FOUND") => Ok(CancelOutcome::NotFound { message }),
        _ => Ok(CancelOutcome::Rejected { message }),
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn insert_group(&self, spec: &GroupSpec) -> Result<BookingGroup, GatewayError> {
        let sql = format!(
            "INSERT INTO booking_groups \
             (slug, name, description, status, ta_required_minutes, \
              date_range_start, date_range_end, daily_start_time, daily_end_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {GROUP_COLUMNS}"
        );
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(&spec.slug)
            .bind(&spec.name)
            .bind(&spec.description)
            .bind(spec.status)
            .bind(i32::try_from(spec.ta_required_minutes).unwrap_or(i32::MAX))
            .bind(spec.date_range_start)
            .bind(spec.date_range_end)
            .bind(spec.daily_start_time)
            .bind(spec.daily_end_time)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e
                    && db.is_unique_violation()
                {
                    return GatewayError::InvalidRequest(format!(
                        "a booking group with slug {:?} already exists",
                        spec.slug
                    ));
                }
                persistence_error(e)
            })?;

        Ok(group_from_row(row))
    }

    async fn group_by_id(&self, id: GroupId) -> Result<BookingGroup, GatewayError> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM booking_groups WHERE id = $1");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_error)?;

        row.map(group_from_row)
            .ok_or(GatewayError::GroupNotFound(*id.as_uuid()))
    }

    async fn group_by_slug(&self, slug: &str) -> Result<BookingGroup, GatewayError> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM booking_groups WHERE slug = $1");
        let row = sqlx::query_as::<_, GroupRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_error)?;

        row.map(group_from_row)
            .ok_or_else(|| GatewayError::SlugNotFound(slug.to_string()))
    }

    async fn list_groups(
        &self,
        statuses: &[GroupStatus],
    ) -> Result<Vec<BookingGroup>, GatewayError> {
        let rows = if statuses.is_empty() {
            let sql = format!(
                "SELECT {GROUP_COLUMNS} FROM booking_groups ORDER BY created_at DESC"
            );
            sqlx::query_as::<_, GroupRow>(&sql).fetch_all(&self.pool).await
        } else {
            let sql = format!(
                "SELECT {GROUP_COLUMNS} FROM booking_groups \
                 WHERE status = ANY($1) ORDER BY created_at DESC"
            );
            sqlx::query_as::<_, GroupRow>(&sql)
                .bind(statuses.to_vec())
                .fetch_all(&self.pool)
                .await
        }
        .map_err(persistence_error)?;

        Ok(rows.into_iter().map(group_from_row).collect())
    }

    async fn update_group_status(
        &self,
        id: GroupId,
        status: GroupStatus,
    ) -> Result<(), GatewayError> {
        let result = sqlx::query("UPDATE booking_groups SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status)
            .execute(&self.pool)
            .await
            .map_err(persistence_error)?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::GroupNotFound(*id.as_uuid()));
        }
        Ok(())
    }

    async fn insert_slots(
        &self,
        slots: &[NewBookingSlot],
    ) -> Result<Vec<BookingSlot>, GatewayError> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let mut group_ids = Vec::with_capacity(slots.len());
        let mut ta_ids = Vec::with_capacity(slots.len());
        let mut starts = Vec::with_capacity(slots.len());
        let mut ends = Vec::with_capacity(slots.len());
        let mut capacities = Vec::with_capacity(slots.len());
        for slot in slots {
            group_ids.push(*slot.booking_group_id.as_uuid());
            ta_ids.push(*slot.ta_id.as_uuid());
            starts.push(slot.start_time);
            ends.push(slot.end_time);
            capacities.push(i32::try_from(slot.capacity).unwrap_or(i32::MAX));
        }

        // Single statement so a batch is all-or-nothing.
        let sql = format!(
            "INSERT INTO booking_slots \
             (booking_group_id, ta_id, start_time, end_time, capacity) \
             SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::timestamptz[], $4::timestamptz[], $5::int4[]) \
             RETURNING {SLOT_COLUMNS}"
        );
        let rows = sqlx::query_as::<_, SlotRow>(&sql)
            .bind(group_ids)
            .bind(ta_ids)
            .bind(starts)
            .bind(ends)
            .bind(capacities)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_error)?;

        Ok(rows.into_iter().map(slot_from_row).collect())
    }

    async fn slot_by_id(&self, id: SlotId) -> Result<BookingSlot, GatewayError> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM booking_slots WHERE id = $1");
        let row = sqlx::query_as::<_, SlotRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(persistence_error)?;

        row.map(slot_from_row)
            .ok_or(GatewayError::SlotNotFound(*id.as_uuid()))
    }

    async fn slots_for_group(&self, group: GroupId) -> Result<Vec<BookingSlot>, GatewayError> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM booking_slots \
             WHERE booking_group_id = $1 ORDER BY start_time"
        );
        let rows = sqlx::query_as::<_, SlotRow>(&sql)
            .bind(group.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_error)?;

        Ok(rows.into_iter().map(slot_from_row).collect())
    }

    async fn slots_for_ta(
        &self,
        group: GroupId,
        ta: TaId,
    ) -> Result<Vec<BookingSlot>, GatewayError> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM booking_slots \
             WHERE booking_group_id = $1 AND ta_id = $2 ORDER BY start_time"
        );
        let rows = sqlx::query_as::<_, SlotRow>(&sql)
            .bind(group.as_uuid())
            .bind(ta.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_error)?;

        Ok(rows.into_iter().map(slot_from_row).collect())
    }

    async fn slots_starting_after(
        &self,
        group: GroupId,
        from: DateTime<Utc>,
    ) -> Result<Vec<BookingSlot>, GatewayError> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM booking_slots \
             WHERE booking_group_id = $1 AND start_time >= $2 ORDER BY start_time"
        );
        let rows = sqlx::query_as::<_, SlotRow>(&sql)
            .bind(group.as_uuid())
            .bind(from)
            .fetch_all(&self.pool)
            .await
            .map_err(persistence_error)?;

        Ok(rows.into_iter().map(slot_from_row).collect())
    }

    async fn delete_slot(&self, id: SlotId, owner: Option<TaId>) -> Result<bool, GatewayError> {
        let result = if let Some(ta) = owner {
            sqlx::query("DELETE FROM booking_slots WHERE id = $1 AND ta_id = $2")
                .bind(id.as_uuid())
                .bind(ta.as_uuid())
                .execute(&self.pool)
                .await
        } else {
            sqlx::query("DELETE FROM booking_slots WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&self.pool)
                .await
        }
        .map_err(persistence_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_bookings_for_slots(
        &self,
        slot_ids: &[SlotId],
    ) -> Result<HashMap<SlotId, u32>, GatewayError> {
        if slot_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<Uuid> = slot_ids.iter().map(|s| *s.as_uuid()).collect();

        let rows = sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT booking_slot_id, COUNT(*) FROM bookings \
             WHERE booking_slot_id = ANY($1) GROUP BY booking_slot_id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| {
                (
                    SlotId::from_uuid(id),
                    u32::try_from(count.max(0)).unwrap_or(u32::MAX),
                )
            })
            .collect())
    }

    async fn create_booking_atomic(
        &self,
        slot: SlotId,
        group: GroupId,
        student: StudentId,
    ) -> Result<BookingOutcome, GatewayError> {
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT create_booking_atomic($1, $2, $3)",
        )
        .bind(slot.as_uuid())
        .bind(group.as_uuid())
        .bind(student.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(persistence_error)?;

        parse_booking_outcome(&value)
    }

    async fn cancel_booking_atomic(
        &self,
        booking: BookingId,
        student: StudentId,
    ) -> Result<CancelOutcome, GatewayError> {
        let value =
            sqlx::query_scalar::<_, serde_json::Value>("SELECT cancel_booking_atomic($1, $2)")
                .bind(booking.as_uuid())
                .bind(student.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(persistence_error)?;

        parse_cancel_outcome(&value)
    }

    async fn booking_by_id(&self, id: BookingId) -> Result<Booking, GatewayError> {
        let row = sqlx::query_as::<_, BookingRow>(
            "SELECT id, booking_slot_id, booking_group_id, student_id, booked_at \
             FROM bookings WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(persistence_error)?;

        row.map(booking_from_row)
            .ok_or(GatewayError::BookingNotFound(*id.as_uuid()))
    }

    async fn bookings_for_group(
        &self,
        group: GroupId,
    ) -> Result<Vec<StudentBooking>, GatewayError> {
        let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Uuid, DateTime<Utc>, Uuid, String, String, DateTime<Utc>)>(
            "SELECT b.id, b.booking_slot_id, b.booking_group_id, b.student_id, b.booked_at, \
                    s.id, s.email, s.name, s.created_at \
             FROM bookings b JOIN students s ON s.id = b.student_id \
             WHERE b.booking_group_id = $1 ORDER BY b.booked_at DESC",
        )
        .bind(group.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        Ok(rows.into_iter().map(student_booking_from_row).collect())
    }

    async fn bookings_for_slots(
        &self,
        slot_ids: &[SlotId],
    ) -> Result<Vec<StudentBooking>, GatewayError> {
        if slot_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = slot_ids.iter().map(|s| *s.as_uuid()).collect();

        let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, Uuid, DateTime<Utc>, Uuid, String, String, DateTime<Utc>)>(
            "SELECT b.id, b.booking_slot_id, b.booking_group_id, b.student_id, b.booked_at, \
                    s.id, s.email, s.name, s.created_at \
             FROM bookings b JOIN students s ON s.id = b.student_id \
             WHERE b.booking_slot_id = ANY($1) ORDER BY b.booked_at",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        Ok(rows.into_iter().map(student_booking_from_row).collect())
    }

    async fn bookings_for_student(
        &self,
        student: StudentId,
    ) -> Result<Vec<(Booking, BookingSlot)>, GatewayError> {
        let rows = sqlx::query_as::<_, (
            Uuid,
            Uuid,
            Uuid,
            Uuid,
            DateTime<Utc>,
            Uuid,
            Uuid,
            Option<Uuid>,
            DateTime<Utc>,
            DateTime<Utc>,
            i32,
            DateTime<Utc>,
        )>(
            "SELECT b.id, b.booking_slot_id, b.booking_group_id, b.student_id, b.booked_at, \
                    sl.id, sl.booking_group_id, sl.ta_id, sl.start_time, sl.end_time, sl.capacity, sl.created_at \
             FROM bookings b JOIN booking_slots sl ON sl.id = b.booking_slot_id \
             WHERE b.student_id = $1 ORDER BY b.booked_at DESC",
        )
        .bind(student.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        Ok(rows
            .into_iter()
            .map(|(bid, bslot, bgroup, bstudent, booked_at, sid, sgroup, sta, start, end, cap, screated)| {
                (
                    booking_from_row((bid, bslot, bgroup, bstudent, booked_at)),
                    slot_from_row((sid, sgroup, sta, start, end, cap, screated)),
                )
            })
            .collect())
    }

    async fn delete_booking(&self, id: BookingId) -> Result<bool, GatewayError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(persistence_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_tas(&self) -> Result<Vec<TeachingAssistant>, GatewayError> {
        let rows = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT id, email, name, created_at FROM tas ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(persistence_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, email, name, created_at)| TeachingAssistant {
                id: TaId::from_uuid(id),
                email,
                name,
                created_at,
            })
            .collect())
    }
}

#[allow(clippy::type_complexity)]
fn student_booking_from_row(
    row: (Uuid, Uuid, Uuid, Uuid, DateTime<Utc>, Uuid, String, String, DateTime<Utc>),
) -> StudentBooking {
    let (id, slot_id, group_id, student_id, booked_at, sid, email, name, created_at) = row;
    StudentBooking {
        booking: booking_from_row((id, slot_id, group_id, student_id, booked_at)),
        student: Student {
            id: StudentId::from_uuid(sid),
            email,
            name,
            created_at,
        },
    }
}
