//! Appointment entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Appointment lifecycle status
///
/// `Confirmed` and `Rescheduled` occupy the staff member's timeline;
/// `Cancelled`, `Completed`, and `NoShow` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Confirmed,
    Rescheduled,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Rescheduled => "rescheduled",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "rescheduled" => Some(AppointmentStatus::Rescheduled),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "completed" => Some(AppointmentStatus::Completed),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    /// Whether this status holds the staff member's interval
    pub fn blocks_slot(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Confirmed | AppointmentStatus::Rescheduled
        )
    }

    /// Whether this status admits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed | AppointmentStatus::NoShow
        )
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A booked appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    /// Unique appointment identifier; also the idempotency key for all
    /// graph-projection writes
    pub id: String,
    /// Customer who booked
    pub customer_id: String,
    /// Staff member performing the service
    pub staff_id: String,
    /// Service being performed
    pub service_id: String,
    /// Interval start (inclusive)
    pub start_time: DateTime<Utc>,
    /// Interval end (exclusive)
    pub end_time: DateTime<Utc>,
    /// Lifecycle status
    pub status: AppointmentStatus,
    /// Free-form notes; completion feedback is appended here
    pub notes: Option<String>,
    /// Reason recorded on cancellation
    pub cancellation_reason: Option<String>,
    /// Whether a reminder has been sent
    pub reminder_sent: bool,
    /// When the appointment was created
    pub created_at: DateTime<Utc>,
    /// When the appointment was last updated
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Create a new confirmed appointment
    pub fn new(
        customer_id: impl Into<String>,
        staff_id: impl Into<String>,
        service_id: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            staff_id: staff_id.into(),
            service_id: service_id.into(),
            start_time,
            end_time,
            status: AppointmentStatus::Confirmed,
            notes: None,
            cancellation_reason: None,
            reminder_sent: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Half-open interval overlap test against another interval
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}
