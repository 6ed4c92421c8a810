//! Slot generation and availability filtering
//!
//! Pure functions over half-open time intervals. Used as building blocks
//! by the booking service, never exposed to callers directly.

use crate::appointments::Appointment;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A candidate half-open time interval `[start, end)` of fixed duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    /// Half-open interval overlap test
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    /// Slot duration in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Availability for a day: the unioned "any staff" list plus per-staff slots
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Availability {
    pub date: NaiveDate,
    pub service_id: String,
    /// Slots available with at least one staff member
    pub available_slots: Vec<Slot>,
    /// Slots available per staff member, keyed by staff id. Empty when the
    /// request was scoped to a single staff member.
    pub staff_availability: HashMap<String, Vec<Slot>>,
}

/// Generate candidate slots for a business day.
///
/// Every slot is `[t, t + duration)` with `t` advancing by `step_minutes`
/// from opening time; only slots that fit entirely within `[open, close)`
/// are produced. Deterministic given inputs, no side effects.
pub fn generate_slots(
    date: NaiveDate,
    open: NaiveTime,
    close: NaiveTime,
    duration_minutes: u32,
    step_minutes: u32,
) -> Vec<Slot> {
    let mut slots = Vec::new();
    if duration_minutes == 0 || step_minutes == 0 || close <= open {
        return slots;
    }

    let duration = chrono::Duration::minutes(i64::from(duration_minutes));
    let step = chrono::Duration::minutes(i64::from(step_minutes));
    let close_dt = date.and_time(close).and_utc();

    let mut current = date.and_time(open).and_utc();
    while current + duration <= close_dt {
        slots.push(Slot {
            start: current,
            end: current + duration,
        });
        current += step;
    }

    slots
}

/// Keep only slots that do not overlap any of the given appointments.
///
/// O(slots x appointments); callers pass appointments already restricted to
/// the relevant day, staff scope, and slot-blocking statuses.
pub fn filter_available(slots: &[Slot], appointments: &[Appointment]) -> Vec<Slot> {
    slots
        .iter()
        .filter(|slot| {
            !appointments
                .iter()
                .any(|appt| slot.overlaps(appt.start_time, appt.end_time))
        })
        .copied()
        .collect()
}

/// Build per-staff availability plus the union of slots free for anyone.
///
/// Appointments are indexed by staff id first so each staff member's filter
/// pass only sees their own timeline.
pub fn staff_availability(
    slots: &[Slot],
    staff_ids: &[String],
    appointments: &[Appointment],
) -> (Vec<Slot>, HashMap<String, Vec<Slot>>) {
    let mut by_staff: HashMap<&str, Vec<&Appointment>> = HashMap::new();
    for appt in appointments {
        by_staff.entry(appt.staff_id.as_str()).or_default().push(appt);
    }

    let mut per_staff = HashMap::new();
    for staff_id in staff_ids {
        let own: Vec<Appointment> = by_staff
            .get(staff_id.as_str())
            .map(|appts| appts.iter().map(|a| (*a).clone()).collect())
            .unwrap_or_default();
        per_staff.insert(staff_id.clone(), filter_available(slots, &own));
    }

    // A slot is in the union iff some staff member has it free
    let union: Vec<Slot> = slots
        .iter()
        .filter(|slot| {
            per_staff
                .values()
                .any(|available| available.contains(slot))
        })
        .copied()
        .collect();

    (union, per_staff)
}
