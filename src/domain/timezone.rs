//! Wall-clock to absolute-instant conversion.
//!
//! Slot times are entered as a local calendar date plus `HH:MM` wall-clock
//! values and persisted as absolute instants. The caller supplies its UTC
//! offset in whole minutes east of UTC (a browser's `getTimezoneOffset()`
//! negated); [`resolve_instant`] stamps that offset onto the wall clock and
//! [`wall_clock_in`] projects a stored instant back into it.
//!
//! The offset is taken per request rather than stored per group, so a slot
//! batch is only self-consistent when created from a single timezone
//! context; a creator who changes zones mid-batch, or a DST boundary inside
//! a group's date range, shifts the absolute instants of "the same local
//! time every day". Known limitation.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

/// Minutes in one day.
const MINUTES_PER_DAY: u32 = 24 * 60;

/// Failures converting wall-clock input to an absolute instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimezoneError {
    /// Offset outside the range a fixed UTC offset can represent.
    #[error("invalid UTC offset: {0} minutes")]
    InvalidOffset(i32),

    /// A minutes-since-midnight value that does not map onto a clock time.
    #[error("invalid wall-clock minutes: {0}")]
    InvalidTime(u32),

    /// The date plus day carry fell outside the representable calendar.
    #[error("date out of range: {0}")]
    DateOutOfRange(NaiveDate),
}

/// Builds a fixed offset from whole minutes east of UTC
/// (e.g. `-300` for UTC-05:00).
///
/// # Errors
///
/// [`TimezoneError::InvalidOffset`] when the offset is not a valid UTC
/// offset (±24 h exclusive).
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, TimezoneError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or(TimezoneError::InvalidOffset(minutes))
}

/// Resolves a calendar date and minutes-since-midnight into an
/// offset-qualified instant. The RFC 3339 rendering embeds the offset,
/// e.g. `2024-03-01T09:00:00-05:00`.
///
/// A value of exactly 1440 (a range ending at 24:00) maps to midnight of
/// the following day.
///
/// # Errors
///
/// [`TimezoneError::InvalidTime`] for minutes beyond one day plus the
/// midnight carry, [`TimezoneError::DateOutOfRange`] at the calendar
/// bounds, and [`TimezoneError::InvalidOffset`] if the offset cannot
/// qualify the wall clock.
pub fn resolve_instant(
    date: NaiveDate,
    minutes: u32,
    offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, TimezoneError> {
    if minutes > MINUTES_PER_DAY {
        return Err(TimezoneError::InvalidTime(minutes));
    }
    let carry = minutes / MINUTES_PER_DAY;
    let rem = minutes % MINUTES_PER_DAY;
    let time = NaiveTime::from_hms_opt(rem / 60, rem % 60, 0)
        .ok_or(TimezoneError::InvalidTime(minutes))?;
    let date = date
        .checked_add_days(Days::new(u64::from(carry)))
        .ok_or(TimezoneError::DateOutOfRange(date))?;

    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or(TimezoneError::InvalidOffset(offset.local_minus_utc() / 60))
}

/// Projects a stored instant into the wall clock of `offset`: the local
/// calendar date and minutes since that date's midnight.
#[must_use]
pub fn wall_clock_in(instant: DateTime<Utc>, offset: FixedOffset) -> (NaiveDate, u32) {
    let local = instant.with_timezone(&offset);
    (local.date_naive(), local.hour() * 60 + local.minute())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default()
    }

    fn est() -> FixedOffset {
        offset_from_minutes(-300)
            .ok()
            .unwrap_or_else(|| panic!("valid offset"))
    }

    #[test]
    fn instant_embeds_the_offset() {
        let instant = resolve_instant(date(), 540, est());
        let Ok(instant) = instant else {
            panic!("resolution should succeed");
        };
        assert_eq!(instant.to_rfc3339(), "2024-03-01T09:00:00-05:00");
    }

    #[test]
    fn same_wall_clock_different_offsets_differ_in_utc() {
        let east = offset_from_minutes(120).ok().unwrap_or_else(|| panic!("offset"));
        let west = offset_from_minutes(-120).ok().unwrap_or_else(|| panic!("offset"));

        let a = resolve_instant(date(), 540, east).ok().unwrap_or_else(|| panic!("instant"));
        let b = resolve_instant(date(), 540, west).ok().unwrap_or_else(|| panic!("instant"));

        let gap = b.with_timezone(&Utc) - a.with_timezone(&Utc);
        assert_eq!(gap.num_hours(), 4);
    }

    #[test]
    fn midnight_carry_rolls_to_next_day() {
        let instant = resolve_instant(date(), MINUTES_PER_DAY, est());
        let Ok(instant) = instant else {
            panic!("resolution should succeed");
        };
        assert_eq!(instant.to_rfc3339(), "2024-03-02T00:00:00-05:00");
    }

    #[test]
    fn beyond_one_day_is_rejected() {
        assert_eq!(
            resolve_instant(date(), MINUTES_PER_DAY + 1, est()),
            Err(TimezoneError::InvalidTime(MINUTES_PER_DAY + 1))
        );
    }

    #[test]
    fn invalid_offsets_are_rejected() {
        assert!(offset_from_minutes(24 * 60).is_err());
        assert!(offset_from_minutes(-24 * 60).is_err());
        assert!(offset_from_minutes(i32::MAX).is_err());
        assert!(offset_from_minutes(0).is_ok());
        assert!(offset_from_minutes(330).is_ok()); // UTC+05:30
    }

    #[test]
    fn wall_clock_round_trips() {
        let offset = est();
        let instant = resolve_instant(date(), 615, offset)
            .ok()
            .unwrap_or_else(|| panic!("instant"));
        let (d, minutes) = wall_clock_in(instant.with_timezone(&Utc), offset);
        assert_eq!(d, date());
        assert_eq!(minutes, 615);
    }

    #[test]
    fn wall_clock_shifts_with_the_offset() {
        // 09:00 EST is 14:00 UTC.
        let instant = resolve_instant(date(), 540, est())
            .ok()
            .unwrap_or_else(|| panic!("instant"));
        let utc_offset = offset_from_minutes(0).ok().unwrap_or_else(|| panic!("offset"));
        let (_, minutes) = wall_clock_in(instant.with_timezone(&Utc), utc_offset);
        assert_eq!(minutes, 840);
    }
}
