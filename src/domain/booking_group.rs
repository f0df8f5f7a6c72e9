//! Booking-group entity and creation-time validation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::schedule::MinuteSpan;
use super::{GroupId, GroupStatus};
use crate::error::GatewayError;

/// A named, time-boxed demo event with its own slot set and lifecycle
/// status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookingGroup {
    /// Unique group identifier.
    pub id: GroupId,
    /// URL slug, unique across groups.
    pub slug: String,
    /// Human-readable name (e.g. `"Week 5 Demo"`).
    pub name: String,
    /// Optional description shown to students and TAs.
    pub description: Option<String>,
    /// Lifecycle status; the only field mutated after creation.
    pub status: GroupStatus,
    /// Minutes of demo slots each TA must contribute.
    pub ta_required_minutes: u32,
    /// First date slots may be created for, when bounded.
    pub date_range_start: Option<NaiveDate>,
    /// Last date slots may be created for, when bounded.
    pub date_range_end: Option<NaiveDate>,
    /// Earliest wall-clock time slots may start, every day in range.
    pub daily_start_time: NaiveTime,
    /// Latest wall-clock time slots may end, every day in range.
    pub daily_end_time: NaiveTime,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl BookingGroup {
    /// The daily booking window as minutes since midnight.
    #[must_use]
    pub fn daily_window(&self) -> MinuteSpan {
        MinuteSpan::from_times(self.daily_start_time, self.daily_end_time)
    }

    /// Whether `date` falls inside the configured date range. Unset bounds
    /// are open-ended.
    #[must_use]
    pub fn date_in_range(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.date_range_start
            && date < start
        {
            return false;
        }
        if let Some(end) = self.date_range_end
            && date > end
        {
            return false;
        }
        true
    }
}

/// Validated input for creating a booking group.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    /// Human-readable name.
    pub name: String,
    /// URL slug.
    pub slug: String,
    /// Optional description.
    pub description: Option<String>,
    /// Initial status.
    pub status: GroupStatus,
    /// Minutes of demo slots each TA must contribute.
    pub ta_required_minutes: u32,
    /// First date slots may be created for.
    pub date_range_start: Option<NaiveDate>,
    /// Last date slots may be created for.
    pub date_range_end: Option<NaiveDate>,
    /// Earliest daily slot start.
    pub daily_start_time: NaiveTime,
    /// Latest daily slot end.
    pub daily_end_time: NaiveTime,
}

impl GroupSpec {
    /// Checks the creation invariants: non-empty name, well-formed slug,
    /// a non-empty daily window, and an ordered date range.
    ///
    /// # Errors
    ///
    /// [`GatewayError::InvalidRequest`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "name must not be empty".to_string(),
            ));
        }
        if !is_valid_slug(&self.slug) {
            return Err(GatewayError::InvalidRequest(format!(
                "invalid slug {:?}: use lowercase letters, digits and hyphens",
                self.slug
            )));
        }
        if self.daily_end_time <= self.daily_start_time {
            return Err(GatewayError::InvalidRequest(
                "daily end time must be after daily start time".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.date_range_start, self.date_range_end)
            && end < start
        {
            return Err(GatewayError::InvalidRequest(
                "date range end must not precede its start".to_string(),
            ));
        }
        Ok(())
    }
}

/// `true` for non-empty `[a-z0-9-]` slugs without leading or trailing
/// hyphens.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Derives a URL slug from a display name: runs of non-alphanumeric
/// characters collapse to single hyphens, ends are trimmed
/// (`"Week 5 Demo"` → `"week-5-demo"`).
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    out
}
