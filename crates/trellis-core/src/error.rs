//! Error types for Trellis

use thiserror::Error;

/// Result type alias using Trellis's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Trellis error types
///
/// Booking-path failures are exhaustive: every failure mode has a distinct
/// variant so callers can decide whether a retry with a different slot makes
/// sense. Graph-store failures on the booking path are caught and queued by
/// the sync coordinator and never reach the caller.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E001-E099)
    #[error("Invalid input: {0}")]
    Validation(String),

    // Entity errors (E100-E199)
    #[error("Customer '{0}' not found")]
    CustomerNotFound(String),

    #[error("Staff member '{0}' not found")]
    StaffNotFound(String),

    #[error("Service '{0}' not found")]
    ServiceNotFound(String),

    #[error("Appointment '{0}' not found")]
    AppointmentNotFound(String),

    // Scheduling conflicts (E200-E299)
    #[error("Time slot is not available")]
    SlotUnavailable,

    #[error("No staff available for this time slot")]
    NoStaffAvailable,

    #[error("Appointment '{0}' is already in terminal status '{1}'")]
    InvalidTransition(String, String),

    // Store errors (E400-E499)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Graph store error: {0}")]
    Graph(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E001",
            Self::CustomerNotFound(_) => "E100",
            Self::StaffNotFound(_) => "E101",
            Self::ServiceNotFound(_) => "E102",
            Self::AppointmentNotFound(_) => "E103",
            Self::SlotUnavailable => "E200",
            Self::NoStaffAvailable => "E201",
            Self::InvalidTransition(..) => "E202",
            Self::Database(_) => "E400",
            Self::Graph(_) => "E401",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Whether the caller may retry the same operation with a different slot
    pub fn is_retryable_conflict(&self) -> bool {
        matches!(self, Self::SlotUnavailable | Self::NoStaffAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::SlotUnavailable.code(), "E200");
        assert_eq!(Error::NoStaffAvailable.code(), "E201");
        assert_eq!(Error::Validation("end before start".into()).code(), "E001");
        assert_eq!(Error::CustomerNotFound("c1".into()).code(), "E100");
    }

    #[test]
    fn test_retryable_conflicts() {
        assert!(Error::SlotUnavailable.is_retryable_conflict());
        assert!(Error::NoStaffAvailable.is_retryable_conflict());
        assert!(!Error::Validation("bad".into()).is_retryable_conflict());
        assert!(!Error::AppointmentNotFound("a1".into()).is_retryable_conflict());
    }
}
