//! Booking-group DTOs for create, list, and status operations.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::booking_group::{GroupSpec, slugify};
use crate::domain::GroupStatus;

/// Request body for `POST /groups`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    /// Human-readable name (e.g. `"Week 5 Demo"`).
    pub name: String,
    /// URL slug; derived from the name when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    /// Optional description shown to students and TAs.
    #[serde(default)]
    pub description: Option<String>,
    /// Initial lifecycle status. Defaults to `hidden`.
    #[serde(default = "default_status")]
    pub status: GroupStatus,
    /// Minutes of demo slots each TA must contribute.
    #[serde(default)]
    pub ta_required_minutes: u32,
    /// First date slots may be created for.
    #[serde(default)]
    pub date_range_start: Option<NaiveDate>,
    /// Last date slots may be created for.
    #[serde(default)]
    pub date_range_end: Option<NaiveDate>,
    /// Earliest daily slot start, `HH:MM`.
    #[serde(with = "super::time_hm")]
    #[schema(value_type = String, example = "09:00")]
    pub daily_start_time: NaiveTime,
    /// Latest daily slot end, `HH:MM`.
    #[serde(with = "super::time_hm")]
    #[schema(value_type = String, example = "17:00")]
    pub daily_end_time: NaiveTime,
}

const fn default_status() -> GroupStatus {
    GroupStatus::Hidden
}

impl CreateGroupRequest {
    /// Converts the request into a creation spec, deriving the slug from
    /// the name when none was supplied.
    #[must_use]
    pub fn into_spec(self) -> GroupSpec {
        let slug = match self.slug {
            Some(slug) if !slug.trim().is_empty() => slug,
            _ => slugify(&self.name),
        };
        GroupSpec {
            name: self.name,
            slug,
            description: self.description,
            status: self.status,
            ta_required_minutes: self.ta_required_minutes,
            date_range_start: self.date_range_start,
            date_range_end: self.date_range_end,
            daily_start_time: self.daily_start_time,
            daily_end_time: self.daily_end_time,
        }
    }
}

/// Request body for `PATCH /groups/{id}/status`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// The status to move the group to.
    pub status: GroupStatus,
}

/// Which listing a caller wants from `GET /groups`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    /// Every group regardless of status.
    #[default]
    Admin,
    /// Groups TAs work with: hidden and published.
    Ta,
    /// Groups students may book: published only.
    Student,
}

impl Audience {
    /// The status filter this audience sees (empty means all).
    #[must_use]
    pub const fn statuses(self) -> &'static [GroupStatus] {
        match self {
            Self::Admin => &[],
            Self::Ta => &[GroupStatus::Hidden, GroupStatus::Published],
            Self::Student => &[GroupStatus::Published],
        }
    }
}

/// Query parameters for `GET /groups`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListGroupsParams {
    /// Listing audience. Defaults to `admin` (all groups).
    #[serde(default)]
    pub audience: Audience,
}
