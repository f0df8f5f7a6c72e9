//! Slot DTOs for preview, bulk creation, and deletion.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::slot::BookingSlot;
use crate::domain::TaId;
use crate::service::SlotBatchSpec;

/// Request body for `POST /groups/{id}/slots`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSlotsRequest {
    /// TA the slots will belong to.
    pub ta_id: uuid::Uuid,
    /// Calendar date the batch lands on, local to the caller.
    pub date: NaiveDate,
    /// Wall-clock start of the range, `HH:MM`.
    #[serde(with = "super::time_hm")]
    #[schema(value_type = String, example = "09:00")]
    pub start_time: NaiveTime,
    /// Wall-clock end of the range, `HH:MM`.
    #[serde(with = "super::time_hm")]
    #[schema(value_type = String, example = "11:00")]
    pub end_time: NaiveTime,
    /// Length of each slot in minutes.
    pub slot_duration_minutes: u32,
    /// Seats per slot.
    pub capacity: u32,
    /// Caller's UTC offset in minutes east of UTC (e.g. `-300` for
    /// UTC-05:00). Defaults to UTC.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl CreateSlotsRequest {
    /// Converts the request into the service-layer batch spec.
    #[must_use]
    pub fn into_spec(self) -> SlotBatchSpec {
        SlotBatchSpec {
            ta_id: TaId::from_uuid(self.ta_id),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            slot_duration_minutes: self.slot_duration_minutes,
            capacity: self.capacity,
            utc_offset_minutes: self.utc_offset_minutes,
        }
    }
}

/// Request body for `POST /groups/{id}/slots/preview`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PreviewSlotsRequest {
    /// Calendar date the batch would land on.
    pub date: NaiveDate,
    /// Wall-clock start of the range, `HH:MM`.
    #[serde(with = "super::time_hm")]
    #[schema(value_type = String, example = "09:00")]
    pub start_time: NaiveTime,
    /// Wall-clock end of the range, `HH:MM`.
    #[serde(with = "super::time_hm")]
    #[schema(value_type = String, example = "11:00")]
    pub end_time: NaiveTime,
    /// Length of each slot in minutes.
    pub slot_duration_minutes: u32,
}

/// Response body for `POST /groups/{id}/slots` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateSlotsResponse {
    /// Number of slots created.
    pub created: usize,
    /// The created slots, in start order.
    pub slots: Vec<BookingSlot>,
}

/// Query parameters for TA-scoped slot deletion.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteSlotParams {
    /// The TA claiming ownership of the slot.
    pub ta_id: uuid::Uuid,
}
