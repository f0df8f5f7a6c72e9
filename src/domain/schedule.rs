//! Slot-schedule planning: interval generation and overlap validation.
//!
//! A TA turns a calendar date plus a wall-clock time range into a batch of
//! equal-length bookable slots. All arithmetic happens in minutes since
//! local midnight, and every function here is pure: the caller fetches the
//! TA's existing slots once, plans against that snapshot, and persists the
//! whole batch only when validation passes — so a rejected plan never
//! leaves a partial slot set behind.

use chrono::{NaiveDate, NaiveTime, Timelike};

/// Half-open interval `[start, end)` in minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinuteSpan {
    /// Inclusive start, minutes since midnight.
    pub start: u32,
    /// Exclusive end, minutes since midnight.
    pub end: u32,
}

impl MinuteSpan {
    /// Creates a span from raw minute offsets.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Creates a span from two wall-clock times on the same day.
    #[must_use]
    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(minutes_since_midnight(start), minutes_since_midnight(end))
    }

    /// Span length in minutes.
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Half-open interval intersection: `[a, b)` and `[c, d)` overlap iff
    /// `a < d && c < b`. Adjacent spans (`b == c`) do not overlap.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Formats the span as `"HH:MM - HH:MM"`.
    #[must_use]
    pub fn format(&self) -> String {
        format!("{} - {}", format_minutes(self.start), format_minutes(self.end))
    }
}

/// Minutes elapsed since midnight for a wall-clock time (seconds dropped).
#[must_use]
pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Formats minutes since midnight as zero-padded `HH:MM`.
#[must_use]
pub fn format_minutes(total: u32) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Validation failures raised while planning a slot batch.
///
/// Every variant is produced before any persistence call, so a failed plan
/// is always fully recoverable by adjusting the form inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The requested range is empty or inverted.
    #[error("invalid time range: end {} must be after start {}", format_minutes(*end), format_minutes(*start))]
    EmptyRange {
        /// Requested range start, minutes since midnight.
        start: u32,
        /// Requested range end, minutes since midnight.
        end: u32,
    },

    /// The range does not fit inside the group's daily booking window.
    #[error("times must be between {} and {}", format_minutes(window.start), format_minutes(window.end))]
    OutOfWindow {
        /// The requested range.
        range: MinuteSpan,
        /// The group's daily window.
        window: MinuteSpan,
    },

    /// Range length is not a whole multiple of the slot duration.
    #[error("{total} minutes is not divisible by {duration} minute slots ({remainder} minutes left over); try a different slot duration")]
    IndivisibleDuration {
        /// Total minutes in the requested range.
        total: u32,
        /// Requested slot duration in minutes.
        duration: u32,
        /// Minutes left over after the last whole slot.
        remainder: u32,
    },

    /// Zero-length slots are not representable.
    #[error("slot duration must be positive")]
    ZeroDuration,

    /// A candidate slot intersects one the TA already has on that date.
    #[error("a slot starting at {} would overlap your existing slot ({}); choose a different time range", format_minutes(candidate.start), existing.format())]
    Overlap {
        /// The rejected candidate span.
        candidate: MinuteSpan,
        /// The existing span it collides with.
        existing: MinuteSpan,
    },
}

/// Splits `range` into consecutive `duration`-minute spans covering it
/// exactly: `[start, start+d), [start+d, start+2d), …`.
///
/// # Errors
///
/// [`PlanError::ZeroDuration`] for a zero duration,
/// [`PlanError::EmptyRange`] when the range is empty or inverted, and
/// [`PlanError::IndivisibleDuration`] when the range length is not a whole
/// multiple of `duration` (reporting the unused remainder).
pub fn generate_intervals(range: MinuteSpan, duration: u32) -> Result<Vec<MinuteSpan>, PlanError> {
    if duration == 0 {
        return Err(PlanError::ZeroDuration);
    }
    if range.end <= range.start {
        return Err(PlanError::EmptyRange {
            start: range.start,
            end: range.end,
        });
    }
    let total = range.duration();
    let remainder = total % duration;
    if remainder != 0 {
        return Err(PlanError::IndivisibleDuration {
            total,
            duration,
            remainder,
        });
    }

    let mut spans = Vec::with_capacity((total / duration) as usize);
    let mut cursor = range.start;
    while cursor < range.end {
        spans.push(MinuteSpan::new(cursor, cursor + duration));
        cursor += duration;
    }
    Ok(spans)
}

/// Checks that `range` lies inside the group's daily booking window
/// (inclusive at both bounds).
///
/// # Errors
///
/// [`PlanError::OutOfWindow`] when either edge escapes the window.
pub fn check_window(range: MinuteSpan, window: MinuteSpan) -> Result<(), PlanError> {
    if range.start < window.start || range.end > window.end {
        return Err(PlanError::OutOfWindow { range, window });
    }
    Ok(())
}

/// Tests every candidate against every existing span and rejects on the
/// first intersection found.
///
/// # Errors
///
/// [`PlanError::Overlap`] naming the conflicting candidate and the
/// existing span, so the caller can adjust the range.
pub fn detect_overlap(candidates: &[MinuteSpan], existing: &[MinuteSpan]) -> Result<(), PlanError> {
    for candidate in candidates {
        for taken in existing {
            if candidate.overlaps(taken) {
                return Err(PlanError::Overlap {
                    candidate: *candidate,
                    existing: *taken,
                });
            }
        }
    }
    Ok(())
}

/// A validated batch of equal-length slots for one date.
///
/// Produced by [`plan_slots`]; carries everything needed to materialize
/// the rows (or just to report a preview count).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotPlan {
    /// Calendar date the batch lands on.
    pub date: NaiveDate,
    /// Consecutive candidate spans, in order.
    pub spans: Vec<MinuteSpan>,
    /// Seats per slot.
    pub capacity: u32,
}

impl SlotPlan {
    /// Number of slots in the batch.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.spans.len()
    }

    /// Total committed minutes across the batch.
    #[must_use]
    pub fn total_minutes(&self) -> u32 {
        self.spans.iter().map(MinuteSpan::duration).sum()
    }
}

/// Plans a slot batch for one date: empty-range and window checks, then
/// divisibility, generation, and finally overlap detection against the
/// TA's existing same-date spans.
///
/// # Errors
///
/// The first [`PlanError`] encountered, in the order above. Nothing is
/// persisted by this function; a failed plan has no side effects.
pub fn plan_slots(
    date: NaiveDate,
    range: MinuteSpan,
    duration: u32,
    capacity: u32,
    window: MinuteSpan,
    existing: &[MinuteSpan],
) -> Result<SlotPlan, PlanError> {
    if range.end <= range.start {
        return Err(PlanError::EmptyRange {
            start: range.start,
            end: range.end,
        });
    }
    check_window(range, window)?;
    let spans = generate_intervals(range, duration)?;
    detect_overlap(&spans, existing)?;
    Ok(SlotPlan {
        date,
        spans,
        capacity,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32) -> MinuteSpan {
        MinuteSpan::new(start, end)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap_or_default()
    }

    const ALL_DAY: MinuteSpan = MinuteSpan::new(0, 1439);

    #[test]
    fn divides_range_into_exact_intervals() {
        // 09:00-11:00 at 10 minutes -> 12 intervals.
        let spans = generate_intervals(span(540, 660), 10).unwrap_or_default();
        assert_eq!(spans.len(), 12);
        assert_eq!(spans.first(), Some(&span(540, 550)));
        assert_eq!(spans.last(), Some(&span(650, 660)));
        // Consecutive and covering: each span starts where the previous ended.
        for pair in spans.windows(2) {
            if let [a, b] = pair {
                assert_eq!(a.end, b.start);
            }
        }
    }

    #[test]
    fn indivisible_range_reports_remainder() {
        let err = generate_intervals(span(540, 650), 25);
        assert_eq!(
            err,
            Err(PlanError::IndivisibleDuration {
                total: 110,
                duration: 25,
                remainder: 10,
            })
        );
    }

    #[test]
    fn empty_and_inverted_ranges_are_rejected() {
        assert!(matches!(
            generate_intervals(span(600, 600), 10),
            Err(PlanError::EmptyRange { .. })
        ));
        assert!(matches!(
            generate_intervals(span(660, 540), 10),
            Err(PlanError::EmptyRange { .. })
        ));
        assert_eq!(generate_intervals(span(540, 660), 0), Err(PlanError::ZeroDuration));
    }

    #[test]
    fn overlap_is_symmetric_and_reflexive() {
        let a = span(600, 610);
        let b = span(605, 615);
        let c = span(610, 620);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(a.overlaps(&a));

        // Adjacent half-open spans do not overlap, in either order.
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn partial_overlap_is_rejected_adjacency_is_not() {
        let existing = [span(600, 610)]; // 10:00 - 10:10

        // 10:05 - 10:15 intersects.
        let err = detect_overlap(&[span(605, 615)], &existing);
        assert!(matches!(err, Err(PlanError::Overlap { .. })));

        // 10:10 - 10:20 touches but does not intersect.
        assert!(detect_overlap(&[span(610, 620)], &existing).is_ok());
    }

    #[test]
    fn containment_counts_as_overlap() {
        let existing = [span(540, 720)];
        assert!(matches!(
            detect_overlap(&[span(600, 615)], &existing),
            Err(PlanError::Overlap { .. })
        ));
        // And the inverse: a candidate swallowing an existing span.
        let existing = [span(600, 615)];
        assert!(matches!(
            detect_overlap(&[span(540, 720)], &existing),
            Err(PlanError::Overlap { .. })
        ));
    }

    #[test]
    fn range_outside_daily_window_is_rejected() {
        let window = span(540, 1020); // 09:00 - 17:00
        assert!(check_window(span(540, 600), window).is_ok());
        assert!(check_window(span(1020, 1020), window).is_ok());
        assert!(matches!(
            check_window(span(520, 600), window),
            Err(PlanError::OutOfWindow { .. })
        ));
        assert!(matches!(
            check_window(span(960, 1080), window),
            Err(PlanError::OutOfWindow { .. })
        ));
    }

    #[test]
    fn plans_a_clean_batch() {
        // 09:00-09:30 at 15 minutes, capacity 2, window 09:00-17:00.
        let plan = plan_slots(date(), span(540, 570), 15, 2, span(540, 1020), &[]);
        let Ok(plan) = plan else {
            panic!("plan should succeed");
        };
        assert_eq!(plan.slot_count(), 2);
        assert_eq!(plan.spans, vec![span(540, 555), span(555, 570)]);
        assert_eq!(plan.capacity, 2);
        assert_eq!(plan.total_minutes(), 30);
    }

    #[test]
    fn existing_slot_blocks_the_whole_batch() {
        // Same batch, but 09:10-09:20 is already taken: the 09:00 candidate
        // must be the one reported.
        let err = plan_slots(date(), span(540, 570), 15, 2, span(540, 1020), &[span(550, 560)]);
        assert_eq!(
            err,
            Err(PlanError::Overlap {
                candidate: span(540, 555),
                existing: span(550, 560),
            })
        );
    }

    #[test]
    fn window_check_runs_before_divisibility() {
        // Both violations present; the window failure wins.
        let err = plan_slots(date(), span(0, 110), 25, 1, span(540, 1020), &[]);
        assert!(matches!(err, Err(PlanError::OutOfWindow { .. })));
    }

    #[test]
    fn overlap_message_names_both_spans() {
        let err = plan_slots(date(), span(540, 570), 15, 2, ALL_DAY, &[span(550, 560)]);
        let Err(err) = err else {
            panic!("plan should fail");
        };
        let message = err.to_string();
        assert!(message.contains("09:00"));
        assert!(message.contains("09:10 - 09:20"));
    }

    #[test]
    fn formats_minutes_zero_padded() {
        assert_eq!(format_minutes(540), "09:00");
        assert_eq!(format_minutes(65), "01:05");
        assert_eq!(format_minutes(0), "00:00");
    }

    #[test]
    fn minutes_since_midnight_drops_seconds() {
        let t = NaiveTime::from_hms_opt(9, 30, 45).unwrap_or_default();
        assert_eq!(minutes_since_midnight(t), 570);
    }
}
