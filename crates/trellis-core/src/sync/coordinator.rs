//! Sync coordinator
//!
//! Applies graph projections after relational commits. The booking path
//! never fails because the graph is unreachable: failed writes are queued
//! in the outbox and the relational commit stands. Curated graph edits
//! (specializations, service links) are operator-driven and surface their
//! errors instead.

use crate::catalog::{Customer, Service, Staff};
use crate::graph::edge::{EdgeKind, GraphNode, NodeKind};
use crate::graph::store::{AppointmentProjection, GraphStore};
use crate::sync::outbox::{OutboxOp, OutboxRepository, OutboxStatus};
use crate::storage::Database;
use crate::Result;
use std::sync::Arc;

/// Outcome of one outbox flush
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries applied and removed
    pub applied: u64,
    /// Entries that failed again and stayed pending
    pub retried: u64,
    /// Entries parked as dead this flush
    pub dead: u64,
}

/// Coordinates writes across the relational store and the graph projection
#[derive(Clone)]
pub struct SyncCoordinator {
    relational: Database,
    graph: Arc<dyn GraphStore>,
    outbox_max_attempts: i64,
}

impl SyncCoordinator {
    pub fn new(relational: Database, graph: Arc<dyn GraphStore>, outbox_max_attempts: u32) -> Self {
        Self {
            relational,
            graph,
            outbox_max_attempts: i64::from(outbox_max_attempts),
        }
    }

    /// The graph store this coordinator writes through
    pub fn graph(&self) -> &Arc<dyn GraphStore> {
        &self.graph
    }

    // ========== Projection writes (outbox-backed) ==========

    /// Mirror a customer into the graph
    pub async fn project_customer(&self, customer: &Customer) -> Result<()> {
        self.apply_or_queue(OutboxOp::UpsertNode {
            node: GraphNode::new(&customer.id, NodeKind::Customer, &customer.name),
        })
        .await
    }

    /// Mirror a staff member into the graph
    pub async fn project_staff(&self, staff: &Staff) -> Result<()> {
        self.apply_or_queue(OutboxOp::UpsertNode {
            node: GraphNode::new(&staff.id, NodeKind::Staff, &staff.name),
        })
        .await
    }

    /// Mirror a service into the graph
    pub async fn project_service(&self, service: &Service) -> Result<()> {
        self.apply_or_queue(OutboxOp::UpsertNode {
            node: GraphNode::new(&service.id, NodeKind::Service, &service.name),
        })
        .await
    }

    /// Project a booked appointment and its structural edges
    pub async fn project_appointment(&self, projection: AppointmentProjection) -> Result<()> {
        self.apply_or_queue(OutboxOp::ProjectAppointment { projection })
            .await
    }

    /// Apply completion feedback: accumulate the service preference and
    /// fold the satisfaction into the staff running average. The caller
    /// guarantees this runs at most once per appointment.
    pub async fn apply_completion(
        &self,
        customer_id: &str,
        staff_id: &str,
        service_id: &str,
        satisfaction: f64,
    ) -> Result<()> {
        self.apply_or_queue(OutboxOp::RecordPreference {
            customer_id: customer_id.to_string(),
            service_id: service_id.to_string(),
            satisfaction,
        })
        .await?;
        self.apply_or_queue(OutboxOp::RecordStaffFeedback {
            customer_id: customer_id.to_string(),
            staff_id: staff_id.to_string(),
            satisfaction,
        })
        .await
    }

    // ========== Curated graph edits (errors surface) ==========

    /// Set a staff member's expertise level for a service
    pub async fn set_specialization(
        &self,
        staff_id: &str,
        service_id: &str,
        expertise_level: f64,
    ) -> Result<()> {
        self.graph
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
        self.graph
            .link_services(service_id, other_service_id, kind, strength)
            .await
    }

    // ========== Outbox ==========

    /// Retry queued graph writes, oldest first
    pub async fn flush_outbox(&self) -> Result<FlushReport> {
        let outbox = OutboxRepository::new(&self.relational);
        let mut report = FlushReport::default();

        for entry in outbox.list_pending(100).await? {
            match self.apply_op(&entry.op).await {
                Ok(()) => {
                    outbox.mark_applied(&entry.id).await?;
                    report.applied += 1;
                }
                Err(e) => {
                    outbox
                        .record_failure(&entry.id, &e.to_string(), self.outbox_max_attempts)
                        .await?;
                    if entry.attempts + 1 >= self.outbox_max_attempts {
                        tracing::error!(
                            outbox_id = %entry.id,
                            op = entry.op.tag(),
                            attempts = entry.attempts + 1,
                            "Outbox entry exhausted its retries"
                        );
                        report.dead += 1;
                    } else {
                        report.retried += 1;
                    }
                }
            }
        }

        if report != FlushReport::default() {
            tracing::info!(
                applied = report.applied,
                retried = report.retried,
                dead = report.dead,
                "Flushed graph outbox"
            );
        }
        Ok(report)
    }

    /// Queued writes awaiting retry
    pub async fn pending_outbox(&self) -> Result<i64> {
        OutboxRepository::new(&self.relational)
            .count(OutboxStatus::Pending)
            .await
    }

    /// Writes that exhausted their retries
    pub async fn dead_outbox(&self) -> Result<i64> {
        OutboxRepository::new(&self.relational)
            .count(OutboxStatus::Dead)
            .await
    }

    async fn apply_or_queue(&self, op: OutboxOp) -> Result<()> {
        if let Err(e) = self.apply_op(&op).await {
            tracing::warn!(op = op.tag(), error = %e, "Graph write failed, queueing for retry");
            OutboxRepository::new(&self.relational)
                .enqueue(&op, &e.to_string())
                .await?;
        }
        Ok(())
    }

    async fn apply_op(&self, op: &OutboxOp) -> Result<()> {
        match op {
            OutboxOp::UpsertNode { node } => self.graph.upsert_node(node).await,
            OutboxOp::ProjectAppointment { projection } => {
                self.graph.project_appointment(projection).await
            }
            OutboxOp::RecordPreference {
                customer_id,
                service_id,
                satisfaction,
            } => {
                self.graph
                    .record_preference(customer_id, service_id, *satisfaction)
                    .await
            }
            OutboxOp::RecordStaffFeedback {
                customer_id,
                staff_id,
                satisfaction,
            } => {
                self.graph
                    .record_staff_feedback(customer_id, staff_id, *satisfaction)
                    .await
            }
        }
    }
}
