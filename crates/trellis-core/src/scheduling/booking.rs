//! Booking service
//!
//! The single entry point for availability, booking, and the appointment
//! lifecycle. The relational write always commits first; graph projection
//! follows through the sync coordinator and never fails a booking.
//!
//! Staff auto-assignment books against each candidate in turn rather than
//! checking first and writing later, so two concurrent bookings for the
//! same slot cannot both land on the same staff member.

use crate::appointments::{Appointment, AppointmentRepository, AppointmentStatus};
use crate::catalog::{Customer, CustomerRepository, Service, ServiceRepository, Staff, StaffRepository};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph::recommend::{Recommender, ServiceRecommendation, StaffRecommendation};
use crate::graph::store::{AppointmentProjection, GraphStore};
use crate::graph::EdgeKind;
use crate::scheduling::slots::{self, Availability};
use crate::storage::Database;
use crate::sync::coordinator::{FlushReport, SyncCoordinator};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// A booking request
#[derive(Debug, Clone)]
pub struct BookingRequest {
    /// Caller-facing customer identity; the customer record is created on
    /// first booking
    pub customer_external_id: String,
    pub customer_name: String,
    pub service_id: String,
    /// Requested staff member; `None` auto-assigns the first free one
    pub staff_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Result of a cancellation
#[derive(Debug, Clone)]
pub struct CancellationOutcome {
    pub appointment: Appointment,
    /// True when the cancellation arrived inside the configured notice
    /// window. Late cancellations are warned about, never refused.
    pub late_notice: bool,
}

/// Facade over the dual-store scheduling core
#[derive(Clone)]
pub struct BookingService {
    relational: Database,
    coordinator: SyncCoordinator,
    recommender: Recommender,
    config: Config,
}

impl BookingService {
    pub fn new(relational: Database, graph: Arc<dyn GraphStore>, config: Config) -> Self {
        let coordinator = SyncCoordinator::new(
            relational.clone(),
            graph.clone(),
            config.sync.outbox_max_attempts,
        );
        Self {
            relational,
            coordinator,
            recommender: Recommender::new(graph),
            config,
        }
    }

    /// The relational database backing the service
    pub fn database(&self) -> &Database {
        &self.relational
    }

    /// The dual-store coordinator
    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ========== Catalog ==========

    /// Register a customer and mirror them into the graph
    pub async fn register_customer(&self, customer: &Customer) -> Result<()> {
        CustomerRepository::new(&self.relational)
            .create(customer)
            .await?;
        self.coordinator.project_customer(customer).await
    }

    /// Register a staff member and mirror them into the graph
    pub async fn register_staff(&self, staff: &Staff) -> Result<()> {
        StaffRepository::new(&self.relational).create(staff).await?;
        self.coordinator.project_staff(staff).await
    }

    /// Register a service and mirror it into the graph
    pub async fn register_service(&self, service: &Service) -> Result<()> {
        ServiceRepository::new(&self.relational)
            .create(service)
            .await?;
        self.coordinator.project_service(service).await
    }

    /// Set a staff member's expertise level for a service
    pub async fn set_specialization(
        &self,
        staff_id: &str,
        service_id: &str,
        expertise_level: f64,
    ) -> Result<()> {
        self.require_staff(staff_id).await?;
        self.require_service(service_id).await?;
        self.coordinator
            .set_specialization(staff_id, service_id, expertise_level)
            .await
    }

    /// Link two services with a curated relation
    pub async fn link_services(
        &self,
        service_id: &str,
        other_service_id: &str,
        kind: EdgeKind,
        strength: f64,
    ) -> Result<()> {
        self.require_service(service_id).await?;
        self.require_service(other_service_id).await?;
        self.coordinator
            .link_services(service_id, other_service_id, kind, strength)
            .await
    }

    // ========== Availability ==========

    /// Compute availability for a service on a given day.
    ///
    /// With `staff_id` set, only that staff member's timeline is consulted
    /// and the per-staff map stays empty. Otherwise the per-staff map
    /// covers every active staff member and `available_slots` is the union
    /// of slots free for at least one of them. `duration_minutes` overrides
    /// the service's own duration when given.
    pub async fn check_availability(
        &self,
        service_id: &str,
        date: NaiveDate,
        staff_id: Option<&str>,
        duration_minutes: Option<u32>,
    ) -> Result<Availability> {
        let service = self.require_service(service_id).await?;
        let duration_minutes = duration_minutes.unwrap_or(service.duration_minutes);
        let open = self
            .config
            .business
            .open_time()
            .map_err(|e| Error::Validation(format!("Invalid business hours: {}", e)))?;
        let close = self
            .config
            .business
            .close_time()
            .map_err(|e| Error::Validation(format!("Invalid business hours: {}", e)))?;

        let candidates = slots::generate_slots(
            date,
            open,
            close,
            duration_minutes,
            self.config.booking.slot_granularity_minutes,
        );

        let repo = AppointmentRepository::new(&self.relational);
        let blocking = repo.list_blocking_for_day(date, staff_id).await?;

        let availability = match staff_id {
            Some(staff_id) => {
                self.require_staff(staff_id).await?;
                Availability {
                    date,
                    service_id: service.id.clone(),
                    available_slots: slots::filter_available(&candidates, &blocking),
                    staff_availability: Default::default(),
                }
            }
            None => {
                let staff_ids: Vec<String> = StaffRepository::new(&self.relational)
                    .list_active()
                    .await?
                    .into_iter()
                    .map(|s| s.id)
                    .collect();
                let (union, per_staff) =
                    slots::staff_availability(&candidates, &staff_ids, &blocking);
                Availability {
                    date,
                    service_id: service.id.clone(),
                    available_slots: union,
                    staff_availability: per_staff,
                }
            }
        };

        tracing::debug!(
            service_id = %availability.service_id,
            %date,
            slots = availability.available_slots.len(),
            "Computed availability"
        );
        Ok(availability)
    }

    // ========== Booking ==========

    /// Book an appointment.
    ///
    /// The customer record is created on first contact, keyed by external
    /// id. When no staff member is requested, active staff are tried in
    /// registration order and the first with the slot free gets the
    /// booking; each try takes the write lock, so a lost race simply moves
    /// on to the next candidate.
    pub async fn book_appointment(&self, request: &BookingRequest) -> Result<Appointment> {
        let service = self.require_service(&request.service_id).await?;
        let end_time = request.start_time + service.duration();

        let customer = CustomerRepository::new(&self.relational)
            .create_or_get(&request.customer_external_id, &request.customer_name)
            .await?;

        let repo = AppointmentRepository::new(&self.relational);
        let appointment = match &request.staff_id {
            Some(staff_id) => {
                self.require_staff(staff_id).await?;
                let appointment =
                    self.build_appointment(&customer, staff_id, &service, request, end_time);
                repo.create_if_slot_free(&appointment).await?;
                appointment
            }
            None => {
                let staff = StaffRepository::new(&self.relational).list_active().await?;
                if staff.is_empty() {
                    return Err(Error::NoStaffAvailable);
                }
                let mut booked = None;
                for candidate in &staff {
                    let appointment = self.build_appointment(
                        &customer,
                        &candidate.id,
                        &service,
                        request,
                        end_time,
                    );
                    match repo.create_if_slot_free(&appointment).await {
                        Ok(()) => {
                            booked = Some(appointment);
                            break;
                        }
                        Err(Error::SlotUnavailable) => continue,
                        Err(e) => return Err(e),
                    }
                }
                booked.ok_or(Error::NoStaffAvailable)?
            }
        };

        tracing::info!(
            appointment_id = %appointment.id,
            customer_id = %appointment.customer_id,
            staff_id = %appointment.staff_id,
            start = %appointment.start_time,
            "Booked appointment"
        );

        self.coordinator.project_customer(&customer).await?;
        self.project(&appointment).await?;
        Ok(appointment)
    }

    fn build_appointment(
        &self,
        customer: &Customer,
        staff_id: &str,
        service: &Service,
        request: &BookingRequest,
        end_time: DateTime<Utc>,
    ) -> Appointment {
        let mut appointment = Appointment::new(
            &customer.id,
            staff_id,
            &service.id,
            request.start_time,
            end_time,
        );
        if let Some(notes) = &request.notes {
            appointment = appointment.with_notes(notes.clone());
        }
        appointment
    }

    // ========== Lifecycle ==========

    /// Cancel an appointment; its slot is immediately bookable again.
    ///
    /// Cancellations inside the notice window are flagged and logged but
    /// never refused.
    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        reason: Option<&str>,
    ) -> Result<CancellationOutcome> {
        let repo = AppointmentRepository::new(&self.relational);
        let appointment = repo.cancel(appointment_id, reason).await?;

        let notice = chrono::Duration::hours(self.config.booking.cancellation_notice_hours);
        let late_notice = appointment.start_time - Utc::now() < notice;
        if late_notice {
            tracing::warn!(
                appointment_id,
                start = %appointment.start_time,
                notice_hours = self.config.booking.cancellation_notice_hours,
                "Late cancellation"
            );
        }

        self.project(&appointment).await?;
        Ok(CancellationOutcome {
            appointment,
            late_notice,
        })
    }

    /// Move an appointment to a new start time with the same staff member.
    /// The new interval is conflict-checked against everything but the
    /// appointment itself; on conflict the original interval is untouched.
    pub async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        new_start: DateTime<Utc>,
    ) -> Result<Appointment> {
        let repo = AppointmentRepository::new(&self.relational);
        let current = repo
            .get(appointment_id)
            .await?
            .ok_or_else(|| Error::AppointmentNotFound(appointment_id.to_string()))?;
        let service = self.require_service(&current.service_id).await?;

        let appointment = repo
            .reschedule_if_slot_free(appointment_id, new_start, new_start + service.duration())
            .await?;

        tracing::info!(appointment_id, new_start = %new_start, "Rescheduled appointment");
        self.project(&appointment).await?;
        Ok(appointment)
    }

    /// Complete an appointment and feed satisfaction into the preference
    /// graph.
    ///
    /// Satisfaction is clamped to `[0.0, 1.0]` and defaults to 1.0. Graph
    /// accumulation happens at most once per appointment: replaying a
    /// completion returns the stored appointment without touching the
    /// graph.
    pub async fn complete_appointment(
        &self,
        appointment_id: &str,
        satisfaction: Option<f64>,
        feedback: Option<&str>,
    ) -> Result<Appointment> {
        let satisfaction = satisfaction.unwrap_or(1.0).clamp(0.0, 1.0);

        let repo = AppointmentRepository::new(&self.relational);
        match repo.complete_if_open(appointment_id, feedback).await? {
            Some(appointment) => {
                tracing::info!(appointment_id, satisfaction, "Completed appointment");
                self.project(&appointment).await?;
                self.coordinator
                    .apply_completion(
                        &appointment.customer_id,
                        &appointment.staff_id,
                        &appointment.service_id,
                        satisfaction,
                    )
                    .await?;
                Ok(appointment)
            }
            None => {
                // Already terminal. A replayed completion is answered with
                // the stored row; any other terminal status is a real error.
                let appointment = repo
                    .get(appointment_id)
                    .await?
                    .ok_or_else(|| Error::AppointmentNotFound(appointment_id.to_string()))?;
                if appointment.status == AppointmentStatus::Completed {
                    tracing::debug!(appointment_id, "Replayed completion ignored");
                    Ok(appointment)
                } else {
                    Err(Error::InvalidTransition(
                        appointment.id,
                        appointment.status.to_string(),
                    ))
                }
            }
        }
    }

    /// Mark an appointment as a no-show. No preference is accumulated.
    pub async fn mark_no_show(&self, appointment_id: &str) -> Result<Appointment> {
        let appointment = AppointmentRepository::new(&self.relational)
            .mark_no_show(appointment_id)
            .await?;
        self.project(&appointment).await?;
        Ok(appointment)
    }

    /// A customer's appointments, newest first
    pub async fn customer_appointments(
        &self,
        customer_id: &str,
        status_filter: Option<&[AppointmentStatus]>,
    ) -> Result<Vec<Appointment>> {
        AppointmentRepository::new(&self.relational)
            .list_for_customer(customer_id, status_filter)
            .await
    }

    // ========== Recommendations ==========

    /// Services similar customers prefer that this customer has not tried
    pub async fn recommend_services(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Vec<ServiceRecommendation> {
        self.recommender.recommend_services(customer_id, limit).await
    }

    /// Staff ranked for a service, personalized when a customer is given
    pub async fn recommend_staff(
        &self,
        service_id: &str,
        customer_id: Option<&str>,
    ) -> Vec<StaffRecommendation> {
        self.recommender.recommend_staff(service_id, customer_id).await
    }

    // ========== Maintenance ==========

    /// Retry graph writes queued in the outbox
    pub async fn flush_graph_outbox(&self) -> Result<FlushReport> {
        self.coordinator.flush_outbox().await
    }

    /// Check both stores are reachable
    pub async fn health_check(&self) -> Result<()> {
        self.relational
            .health_check()
            .await
            .map_err(|e| Error::Other(e.to_string()))?;
        self.coordinator.graph().health_check().await
    }

    // ========== Helpers ==========

    async fn require_service(&self, service_id: &str) -> Result<Service> {
        ServiceRepository::new(&self.relational)
            .get(service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| Error::ServiceNotFound(service_id.to_string()))
    }

    async fn require_staff(&self, staff_id: &str) -> Result<Staff> {
        StaffRepository::new(&self.relational)
            .get(staff_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| Error::StaffNotFound(staff_id.to_string()))
    }

    async fn project(&self, appointment: &Appointment) -> Result<()> {
        self.coordinator
            .project_appointment(AppointmentProjection {
                appointment_id: appointment.id.clone(),
                customer_id: appointment.customer_id.clone(),
                staff_id: appointment.staff_id.clone(),
                service_id: appointment.service_id.clone(),
                start_time: appointment.start_time,
                end_time: appointment.end_time,
                status: appointment.status.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::SqliteGraphStore;
    use crate::storage::Schema;
    use chrono::NaiveTime;

    async fn service() -> BookingService {
        let relational = Database::in_memory(Schema::Relational).await.unwrap();
        let graph_db = Database::in_memory(Schema::Graph).await.unwrap();
        let graph = Arc::new(SqliteGraphStore::new(graph_db));
        BookingService::new(relational, graph, Config::default())
    }

    async fn seed(booking: &BookingService) -> (String, String) {
        let staff = Staff::new("Sara", "sara@example.com");
        booking.register_staff(&staff).await.unwrap();
        let massage = Service::new("Swedish Massage", 60, 80.0);
        booking.register_service(&massage).await.unwrap();
        (staff.id, massage.id)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        day()
            .and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
            .and_utc()
    }

    fn request(service_id: &str, start: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            customer_external_id: "ext-1".to_string(),
            customer_name: "Alice".to_string(),
            service_id: service_id.to_string(),
            staff_id: None,
            start_time: start,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_booked_slot_disappears_from_availability() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();

        let availability = booking
            .check_availability(&massage, day(), None, None)
            .await
            .unwrap();
        let starts: Vec<DateTime<Utc>> = availability
            .available_slots
            .iter()
            .map(|s| s.start)
            .collect();

        // 60-minute service on a 30-minute grid: starts at 09:30, 10:00,
        // and 10:30 all collide with the 10:00-11:00 booking
        assert!(starts.contains(&at(9, 0)));
        assert!(!starts.contains(&at(9, 30)));
        assert!(!starts.contains(&at(10, 0)));
        assert!(!starts.contains(&at(10, 30)));
        assert!(starts.contains(&at(11, 0)));
    }

    #[tokio::test]
    async fn test_duration_override_changes_slot_grid() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();

        // A 30-minute consultation fits right up against the 10:00-11:00
        // booking, where the default 60-minute duration would not
        let availability = booking
            .check_availability(&massage, day(), None, Some(30))
            .await
            .unwrap();
        let starts: Vec<DateTime<Utc>> = availability
            .available_slots
            .iter()
            .map(|s| s.start)
            .collect();

        assert!(starts.contains(&at(9, 30)));
        assert!(!starts.contains(&at(10, 0)));
        assert!(!starts.contains(&at(10, 30)));
        assert!(starts.contains(&at(11, 0)));
    }

    #[tokio::test]
    async fn test_auto_assign_falls_through_to_free_staff() {
        let booking = service().await;
        let (first_staff, massage) = seed(&booking).await;
        let second = Staff::new("Anna", "anna@example.com");
        booking.register_staff(&second).await.unwrap();

        let a = booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();
        assert_eq!(a.staff_id, first_staff);

        let mut again = request(&massage, at(10, 0));
        again.customer_external_id = "ext-2".to_string();
        again.customer_name = "Bob".to_string();
        let b = booking.book_appointment(&again).await.unwrap();
        assert_eq!(b.staff_id, second.id);
    }

    #[tokio::test]
    async fn test_all_staff_busy_is_no_staff_available() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();

        let mut again = request(&massage, at(10, 0));
        again.customer_external_id = "ext-2".to_string();
        let err = booking.book_appointment(&again).await.unwrap_err();
        assert!(matches!(err, Error::NoStaffAvailable));
    }

    #[tokio::test]
    async fn test_requested_staff_conflict_is_slot_unavailable() {
        let booking = service().await;
        let (staff_id, massage) = seed(&booking).await;

        let mut first = request(&massage, at(10, 0));
        first.staff_id = Some(staff_id.clone());
        booking.book_appointment(&first).await.unwrap();

        let mut second = request(&massage, at(10, 30));
        second.customer_external_id = "ext-2".to_string();
        second.staff_id = Some(staff_id);
        let err = booking.book_appointment(&second).await.unwrap_err();
        assert!(matches!(err, Error::SlotUnavailable));
    }

    #[tokio::test]
    async fn test_deactivated_customer_cannot_book() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        let appointment = booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();
        CustomerRepository::new(booking.database())
            .deactivate(&appointment.customer_id)
            .await
            .unwrap();

        let err = booking
            .book_appointment(&request(&massage, at(13, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CustomerNotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_service_rejected() {
        let booking = service().await;
        seed(&booking).await;

        let err = booking
            .book_appointment(&request("missing", at(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ServiceNotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_frees_the_slot() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        let appointment = booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();
        booking
            .cancel_appointment(&appointment.id, Some("sick"))
            .await
            .unwrap();

        let mut again = request(&massage, at(10, 0));
        again.customer_external_id = "ext-2".to_string();
        booking.book_appointment(&again).await.unwrap();
    }

    #[tokio::test]
    async fn test_late_cancellation_is_flagged_not_refused() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        // Tomorrow-ish start inside the 24h notice window
        let soon = Utc::now() + chrono::Duration::hours(2);
        let appointment = booking
            .book_appointment(&request(&massage, soon))
            .await
            .unwrap();

        let outcome = booking
            .cancel_appointment(&appointment.id, None)
            .await
            .unwrap();
        assert!(outcome.late_notice);
        assert_eq!(outcome.appointment.status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_reschedule_keeps_duration() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        let appointment = booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();
        let moved = booking
            .reschedule_appointment(&appointment.id, at(14, 0))
            .await
            .unwrap();

        assert_eq!(moved.start_time, at(14, 0));
        assert_eq!(moved.end_time, at(15, 0));
        assert_eq!(moved.status, AppointmentStatus::Rescheduled);
    }

    #[tokio::test]
    async fn test_completion_feeds_graph_once() {
        let booking = service().await;
        let (staff_id, massage) = seed(&booking).await;

        let appointment = booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();
        booking
            .complete_appointment(&appointment.id, Some(0.8), Some("great"))
            .await
            .unwrap();

        // Replay: same row back, no second accumulation
        let replay = booking
            .complete_appointment(&appointment.id, Some(0.8), None)
            .await
            .unwrap();
        assert_eq!(replay.status, AppointmentStatus::Completed);

        let graph = booking.coordinator().graph();
        let prefs = graph
            .preferred_services(&appointment.customer_id)
            .await
            .unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].count, 1);
        assert!((prefs[0].strength - 0.8).abs() < 1e-9);

        let worked = graph
            .worked_with(&appointment.customer_id, &staff_id)
            .await
            .unwrap()
            .unwrap();
        assert!((worked.satisfaction - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_completing_cancelled_appointment_fails() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        let appointment = booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();
        booking
            .cancel_appointment(&appointment.id, None)
            .await
            .unwrap();

        let err = booking
            .complete_appointment(&appointment.id, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(..)));
    }

    #[tokio::test]
    async fn test_satisfaction_clamped() {
        let booking = service().await;
        let (_, massage) = seed(&booking).await;

        let appointment = booking
            .book_appointment(&request(&massage, at(10, 0)))
            .await
            .unwrap();
        booking
            .complete_appointment(&appointment.id, Some(7.5), None)
            .await
            .unwrap();

        let prefs = booking
            .coordinator()
            .graph()
            .preferred_services(&appointment.customer_id)
            .await
            .unwrap();
        assert!((prefs[0].strength - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_per_staff_availability_reported() {
        let booking = service().await;
        let (first_staff, massage) = seed(&booking).await;
        let second = Staff::new("Anna", "anna@example.com");
        booking.register_staff(&second).await.unwrap();

        let mut req = request(&massage, at(10, 0));
        req.staff_id = Some(first_staff.clone());
        booking.book_appointment(&req).await.unwrap();

        let availability = booking
            .check_availability(&massage, day(), None, None)
            .await
            .unwrap();

        // Anna is free all day, so the union keeps 10:00
        assert!(availability
            .available_slots
            .iter()
            .any(|s| s.start == at(10, 0)));
        let sara_slots = &availability.staff_availability[&first_staff];
        assert!(!sara_slots.iter().any(|s| s.start == at(10, 0)));
        let anna_slots = &availability.staff_availability[&second.id];
        assert!(anna_slots.iter().any(|s| s.start == at(10, 0)));
    }
}
