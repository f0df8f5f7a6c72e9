//! Service layer: orchestration of the booking domain over the store port.

pub mod booking_service;

pub use booking_service::{
    BookingService, BookingWithSlot, SlotBatchSpec, SlotOccupancy, SlotPlanPreview,
    SlotWithBookings, TaFulfillment, TaSlotBoard,
};
