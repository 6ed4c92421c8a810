//! Appointment repository
//!
//! All writes that depend on the no-overlap invariant run inside an
//! immediate transaction: the write lock is taken before the conflict
//! check, so check-and-insert is serialized against concurrent bookings
//! for the same staff member. A plain select-then-insert under default
//! isolation would be a race.

use crate::appointments::entity::{Appointment, AppointmentStatus};
use crate::storage::Database;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

const SELECT_COLUMNS: &str = "id, customer_id, staff_id, service_id, start_time, end_time, status, notes, cancellation_reason, reminder_sent, created_at, updated_at";

/// Appointment repository for database operations
pub struct AppointmentRepository<'a> {
    db: &'a Database,
}

impl<'a> AppointmentRepository<'a> {
    /// Create a new appointment repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Get an appointment by ID
    pub async fn get(&self, id: &str) -> Result<Option<Appointment>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM appointments WHERE id = ?",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(row_to_appointment))
    }

    /// Insert a new appointment, failing with `SlotUnavailable` if any
    /// confirmed or rescheduled appointment for the same staff member
    /// overlaps `[start_time, end_time)`.
    pub async fn create_if_slot_free(&self, appointment: &Appointment) -> Result<()> {
        if appointment.end_time <= appointment.start_time {
            return Err(Error::Validation(
                "Appointment end must be after start".to_string(),
            ));
        }

        let mut conn = self.db.pool().acquire().await?;
        begin_immediate(&mut conn).await?;

        let result = async {
            let conflicts = count_overlapping(
                &mut conn,
                &appointment.staff_id,
                appointment.start_time,
                appointment.end_time,
                None,
            )
            .await?;
            if conflicts > 0 {
                return Err(Error::SlotUnavailable);
            }

            sqlx::query(
                r#"
                INSERT INTO appointments (id, customer_id, staff_id, service_id, start_time, end_time, status, notes, reminder_sent, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&appointment.id)
            .bind(&appointment.customer_id)
            .bind(&appointment.staff_id)
            .bind(&appointment.service_id)
            .bind(appointment.start_time)
            .bind(appointment.end_time)
            .bind(appointment.status.as_str())
            .bind(&appointment.notes)
            .bind(appointment.reminder_sent)
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .execute(&mut *conn)
            .await?;

            Ok(())
        }
        .await;

        finish(&mut conn, result).await
    }

    /// Move an appointment to a new interval, re-running the overlap check
    /// scoped to the same staff member and excluding the appointment being
    /// moved. On conflict the stored interval is untouched.
    pub async fn reschedule_if_slot_free(
        &self,
        id: &str,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<Appointment> {
        if new_end <= new_start {
            return Err(Error::Validation(
                "Appointment end must be after start".to_string(),
            ));
        }

        let mut conn = self.db.pool().acquire().await?;
        begin_immediate(&mut conn).await?;

        let result = async {
            let current = fetch_one(&mut conn, id)
                .await?
                .ok_or_else(|| Error::AppointmentNotFound(id.to_string()))?;

            if current.status.is_terminal() {
                return Err(Error::InvalidTransition(
                    id.to_string(),
                    current.status.to_string(),
                ));
            }

            let conflicts =
                count_overlapping(&mut conn, &current.staff_id, new_start, new_end, Some(id))
                    .await?;
            if conflicts > 0 {
                return Err(Error::SlotUnavailable);
            }

            sqlx::query(
                "UPDATE appointments SET start_time = ?, end_time = ?, status = 'rescheduled', updated_at = ? WHERE id = ?",
            )
            .bind(new_start)
            .bind(new_end)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?;

            let updated = fetch_one(&mut conn, id)
                .await?
                .ok_or_else(|| Error::AppointmentNotFound(id.to_string()))?;
            Ok(updated)
        }
        .await;

        finish(&mut conn, result).await
    }

    /// Cancel an appointment, recording the reason. Fails with
    /// `InvalidTransition` if the appointment is already terminal.
    pub async fn cancel(&self, id: &str, reason: Option<&str>) -> Result<Appointment> {
        self.transition_guarded(id, AppointmentStatus::Cancelled, reason, None)
            .await
    }

    /// Mark an appointment as a no-show
    pub async fn mark_no_show(&self, id: &str) -> Result<Appointment> {
        self.transition_guarded(id, AppointmentStatus::NoShow, None, None)
            .await
    }

    /// Mark an appointment completed, appending feedback to notes.
    ///
    /// Returns `Ok(None)` when the appointment was already terminal — the
    /// guarded transition is what makes completion-triggered graph updates
    /// at-most-once per appointment.
    pub async fn complete_if_open(
        &self,
        id: &str,
        feedback: Option<&str>,
    ) -> Result<Option<Appointment>> {
        match self
            .transition_guarded(id, AppointmentStatus::Completed, None, feedback)
            .await
        {
            Ok(appointment) => Ok(Some(appointment)),
            Err(Error::InvalidTransition(..)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Guarded status transition: only non-terminal appointments move.
    async fn transition_guarded(
        &self,
        id: &str,
        to: AppointmentStatus,
        cancellation_reason: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<Appointment> {
        let mut conn = self.db.pool().acquire().await?;
        begin_immediate(&mut conn).await?;

        let result = async {
            let current = fetch_one(&mut conn, id)
                .await?
                .ok_or_else(|| Error::AppointmentNotFound(id.to_string()))?;

            if current.status.is_terminal() {
                return Err(Error::InvalidTransition(
                    id.to_string(),
                    current.status.to_string(),
                ));
            }

            let notes = match feedback {
                Some(fb) => match &current.notes {
                    Some(existing) => Some(format!("{}\nFeedback: {}", existing, fb)),
                    None => Some(format!("Feedback: {}", fb)),
                },
                None => current.notes.clone(),
            };

            sqlx::query(
                "UPDATE appointments SET status = ?, notes = ?, cancellation_reason = ?, updated_at = ? WHERE id = ?",
            )
            .bind(to.as_str())
            .bind(&notes)
            .bind(cancellation_reason.or(current.cancellation_reason.as_deref()))
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?;

            let updated = fetch_one(&mut conn, id)
                .await?
                .ok_or_else(|| Error::AppointmentNotFound(id.to_string()))?;
            Ok(updated)
        }
        .await;

        finish(&mut conn, result).await
    }

    /// Find confirmed/rescheduled appointments for a staff member
    /// overlapping `[start, end)`
    pub async fn find_overlapping(
        &self,
        staff_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM appointments
             WHERE staff_id = ?
               AND status IN ('confirmed', 'rescheduled')
               AND start_time < ? AND end_time > ?
             ORDER BY start_time",
            SELECT_COLUMNS
        ))
        .bind(staff_id)
        .bind(end)
        .bind(start)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_appointment).collect())
    }

    /// List slot-blocking appointments for a calendar day, optionally
    /// scoped to one staff member
    pub async fn list_blocking_for_day(
        &self,
        date: NaiveDate,
        staff_id: Option<&str>,
    ) -> Result<Vec<Appointment>> {
        let day_start = date.and_hms_opt(0, 0, 0).expect("valid midnight").and_utc();
        let day_end = day_start + chrono::Duration::days(1);

        let rows = if let Some(staff_id) = staff_id {
            sqlx::query(&format!(
                "SELECT {} FROM appointments
                 WHERE staff_id = ?
                   AND status IN ('confirmed', 'rescheduled')
                   AND start_time < ? AND end_time > ?
                 ORDER BY start_time",
                SELECT_COLUMNS
            ))
            .bind(staff_id)
            .bind(day_end)
            .bind(day_start)
            .fetch_all(self.db.pool())
            .await?
        } else {
            sqlx::query(&format!(
                "SELECT {} FROM appointments
                 WHERE status IN ('confirmed', 'rescheduled')
                   AND start_time < ? AND end_time > ?
                 ORDER BY start_time",
                SELECT_COLUMNS
            ))
            .bind(day_end)
            .bind(day_start)
            .fetch_all(self.db.pool())
            .await?
        };

        Ok(rows.into_iter().map(row_to_appointment).collect())
    }

    /// List a customer's appointments, newest first, optionally filtered
    /// by status
    pub async fn list_for_customer(
        &self,
        customer_id: &str,
        status_filter: Option<&[AppointmentStatus]>,
    ) -> Result<Vec<Appointment>> {
        let rows = match status_filter {
            Some(statuses) if !statuses.is_empty() => {
                let placeholders = vec!["?"; statuses.len()].join(", ");
                let sql = format!(
                    "SELECT {} FROM appointments WHERE customer_id = ? AND status IN ({}) ORDER BY start_time DESC",
                    SELECT_COLUMNS, placeholders
                );
                let mut query = sqlx::query(&sql).bind(customer_id);
                for status in statuses {
                    query = query.bind(status.as_str());
                }
                query.fetch_all(self.db.pool()).await?
            }
            _ => {
                sqlx::query(&format!(
                    "SELECT {} FROM appointments WHERE customer_id = ? ORDER BY start_time DESC",
                    SELECT_COLUMNS
                ))
                .bind(customer_id)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        Ok(rows.into_iter().map(row_to_appointment).collect())
    }

    /// List confirmed/rescheduled appointments starting before `cutoff`
    /// that have not had a reminder sent
    pub async fn list_needing_reminder(&self, cutoff: DateTime<Utc>) -> Result<Vec<Appointment>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM appointments
             WHERE status IN ('confirmed', 'rescheduled')
               AND reminder_sent = 0
               AND start_time > ? AND start_time <= ?
             ORDER BY start_time",
            SELECT_COLUMNS
        ))
        .bind(Utc::now())
        .bind(cutoff)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_appointment).collect())
    }

    /// Record that a reminder was sent
    pub async fn mark_reminder_sent(&self, id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE appointments SET reminder_sent = 1, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AppointmentNotFound(id.to_string()));
        }
        Ok(())
    }
}

/// Take the write lock up front so the conflict check and the write that
/// follows cannot interleave with another booking transaction
async fn begin_immediate(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(())
}

/// Commit on success, roll back on failure
async fn finish<T>(conn: &mut SqliteConnection, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            sqlx::query("COMMIT").execute(&mut *conn).await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                tracing::warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

async fn fetch_one(conn: &mut SqliteConnection, id: &str) -> Result<Option<Appointment>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM appointments WHERE id = ?",
        SELECT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(row_to_appointment))
}

async fn count_overlapping(
    conn: &mut SqliteConnection,
    staff_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<&str>,
) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM appointments
         WHERE staff_id = ?
           AND status IN ('confirmed', 'rescheduled')
           AND start_time < ? AND end_time > ?
           AND id != ?",
    )
    .bind(staff_id)
    .bind(end)
    .bind(start)
    .bind(exclude.unwrap_or(""))
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Convert a database row to an Appointment
fn row_to_appointment(row: SqliteRow) -> Appointment {
    Appointment {
        id: row.get("id"),
        customer_id: row.get("customer_id"),
        staff_id: row.get("staff_id"),
        service_id: row.get("service_id"),
        start_time: row.get("start_time"),
        end_time: row.get("end_time"),
        status: AppointmentStatus::parse(row.get("status")).unwrap_or_default(),
        notes: row.get("notes"),
        cancellation_reason: row.get("cancellation_reason"),
        reminder_sent: row.get("reminder_sent"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
