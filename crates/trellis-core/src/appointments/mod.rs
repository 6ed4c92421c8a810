//! Appointments of record
//!
//! The appointment row in the relational store is authoritative for
//! identity, interval, and lifecycle status. Rows are never deleted;
//! lifecycle transitions are status changes.

pub mod entity;
pub mod repository;

pub use entity::{Appointment, AppointmentStatus};
pub use repository::AppointmentRepository;
