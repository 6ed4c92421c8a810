//! Scheduling
//!
//! Slot arithmetic plus the booking facade that ties the relational store,
//! the sync coordinator, and the recommender together.

pub mod booking;
pub mod slots;

pub use booking::{BookingRequest, BookingService, CancellationOutcome};
pub use slots::{filter_available, generate_slots, staff_availability, Availability, Slot};
