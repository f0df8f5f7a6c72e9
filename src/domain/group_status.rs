//! Booking-group lifecycle status and the action gate.
//!
//! Every user-facing affordance derives from one lookup table instead of
//! ad hoc per-view checks: [`GroupStatus::allows`] answers what students
//! and TAs may do in each status, and [`GroupStatus::can_transition_to`]
//! bounds administrator status changes to the forward-only lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a booking group.
///
/// `hidden → published → locked`, with `inactive` as a terminal
/// off-switch reachable from any live status. While `hidden`, TAs build
/// out their slots; `published` opens booking to students; `locked`
/// freezes bookings while keeping them visible to TAs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "group_status", rename_all = "lowercase")]
pub enum GroupStatus {
    /// Visible to TAs only; slots may be added and deleted.
    Hidden,
    /// Open for student booking and cancellation.
    Published,
    /// Bookings frozen; TAs and admins can still review them.
    Locked,
    /// Switched off for everyone. Terminal.
    Inactive,
}

/// An action whose legality depends only on the group's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupAction {
    /// A student reserving a slot.
    StudentBook,
    /// A student cancelling their existing booking.
    StudentCancel,
    /// A TA adding or deleting their own slots.
    TaAddSlot,
    /// A TA viewing which students booked their slots.
    TaViewBookings,
}

impl GroupStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Hidden, Self::Published, Self::Locked, Self::Inactive];

    /// Whether `action` is permitted while a group is in this status.
    ///
    /// | Status    | book | cancel | add slots | view bookings |
    /// |-----------|------|--------|-----------|---------------|
    /// | hidden    | no   | no     | yes       | no            |
    /// | published | yes  | yes    | no        | yes           |
    /// | locked    | no   | no     | no        | yes           |
    /// | inactive  | no   | no     | no        | no            |
    #[must_use]
    pub const fn allows(self, action: GroupAction) -> bool {
        match (self, action) {
            (Self::Hidden, GroupAction::TaAddSlot)
            | (
                Self::Published,
                GroupAction::StudentBook | GroupAction::StudentCancel | GroupAction::TaViewBookings,
            )
            | (Self::Locked, GroupAction::TaViewBookings) => true,
            _ => false,
        }
    }

    /// Whether students see this group in their listings. A locked group
    /// still shows a student their own existing booking, but is no longer
    /// listed as bookable.
    #[must_use]
    pub const fn listed_for_students(self) -> bool {
        matches!(self, Self::Published)
    }

    /// Whether TAs may open this group at all.
    #[must_use]
    pub const fn accessible_to_tas(self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Whether an administrator may move a group from this status to
    /// `next`: forward through the lifecycle, or off to `inactive`.
    /// `inactive` is terminal; there is no backward transition, so slots
    /// can never reopen for editing once students have seen the group.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Hidden, Self::Published)
                | (Self::Published, Self::Locked)
                | (Self::Hidden | Self::Published | Self::Locked, Self::Inactive)
        )
    }

    /// Lowercase wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Published => "published",
            Self::Locked => "locked",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for GroupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StudentBook => "booking a slot",
            Self::StudentCancel => "cancelling a booking",
            Self::TaAddSlot => "adding or deleting slots",
            Self::TaViewBookings => "viewing bookings",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const ACTIONS: [GroupAction; 4] = [
        GroupAction::StudentBook,
        GroupAction::StudentCancel,
        GroupAction::TaAddSlot,
        GroupAction::TaViewBookings,
    ];

    #[test]
    fn gate_matches_lifecycle_table() {
        use GroupAction::*;
        use GroupStatus::*;

        let expectations = [
            (Hidden, StudentBook, false),
            (Hidden, StudentCancel, false),
            (Hidden, TaAddSlot, true),
            (Hidden, TaViewBookings, false),
            (Published, StudentBook, true),
            (Published, StudentCancel, true),
            (Published, TaAddSlot, false),
            (Published, TaViewBookings, true),
            (Locked, StudentBook, false),
            (Locked, StudentCancel, false),
            (Locked, TaAddSlot, false),
            (Locked, TaViewBookings, true),
            (Inactive, StudentBook, false),
            (Inactive, StudentCancel, false),
            (Inactive, TaAddSlot, false),
            (Inactive, TaViewBookings, false),
        ];

        for (status, action, expected) in expectations {
            assert_eq!(
                status.allows(action),
                expected,
                "{status} / {action:?} should be {expected}"
            );
        }
    }

    #[test]
    fn gate_is_total() {
        // Every status × action pair resolves without falling through to
        // some undefined combination.
        for status in GroupStatus::ALL {
            for action in ACTIONS {
                let _ = status.allows(action);
            }
        }
    }

    #[test]
    fn only_forward_transitions_are_legal() {
        use GroupStatus::*;

        assert!(Hidden.can_transition_to(Published));
        assert!(Published.can_transition_to(Locked));
        assert!(Hidden.can_transition_to(Inactive));
        assert!(Published.can_transition_to(Inactive));
        assert!(Locked.can_transition_to(Inactive));

        // No reopening once students have seen the group.
        assert!(!Published.can_transition_to(Hidden));
        assert!(!Locked.can_transition_to(Hidden));
        assert!(!Locked.can_transition_to(Published));

        // Inactive is terminal.
        for next in GroupStatus::ALL {
            assert!(!Inactive.can_transition_to(next));
        }

        // No self-transitions.
        for status in GroupStatus::ALL {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn visibility_helpers_follow_the_gate() {
        assert!(GroupStatus::Published.listed_for_students());
        assert!(!GroupStatus::Hidden.listed_for_students());
        assert!(!GroupStatus::Locked.listed_for_students());

        assert!(GroupStatus::Hidden.accessible_to_tas());
        assert!(GroupStatus::Locked.accessible_to_tas());
        assert!(!GroupStatus::Inactive.accessible_to_tas());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&GroupStatus::Published).ok();
        assert_eq!(json.as_deref(), Some("\"published\""));
        let parsed: Option<GroupStatus> = serde_json::from_str("\"locked\"").ok();
        assert_eq!(parsed, Some(GroupStatus::Locked));
    }
}
