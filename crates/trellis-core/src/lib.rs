//! Trellis Core Library
//!
//! This crate provides the core functionality for Trellis, including:
//! - Slot generation and availability filtering
//! - Booking engine and appointment lifecycle (cancel, reschedule, complete)
//! - Catalog management (customers, staff, services)
//! - Preference graph updates and recommendation scoring
//! - Dual-store coordination between the relational record and the
//!   derived graph projection
//! - Storage (SQLite, separate databases for the two stores)

pub mod appointments;
pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod scheduling;
pub mod storage;
pub mod sync;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::appointments::{Appointment, AppointmentStatus};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::scheduling::BookingService;
    pub use crate::storage::Database;
}
