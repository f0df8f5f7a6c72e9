//! Persistence layer: the store port and its PostgreSQL implementation.
//!
//! [`store::BookingStore`] is the complete set of persistence capabilities
//! the service depends on. Booking creation and cancellation are delegated
//! to atomic server-side procedures and surface here only as outcome
//! values; everything else is ordinary queries.

pub mod models;
pub mod postgres;
pub mod store;

pub use store::{BookingOutcome, BookingStore, CancelOutcome};
