//! Identity records and read-side join shapes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::booking::Booking;
use crate::domain::{StudentId, TaId};

/// A teaching assistant identity row.
///
/// Managed outside this service; read here only so fulfillment reports
/// can name their subjects.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeachingAssistant {
    /// Unique TA identifier.
    pub id: TaId,
    /// Contact email (unique).
    pub email: String,
    /// Display name.
    pub name: String,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A student identity row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Student {
    /// Unique student identifier.
    pub id: StudentId,
    /// Contact email (unique).
    pub email: String,
    /// Display name.
    pub name: String,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A booking joined with the student who holds it, for TA and admin
/// review surfaces.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentBooking {
    /// The booking row.
    pub booking: Booking,
    /// The student holding it.
    pub student: Student,
}
