//! Graph store trait
//!
//! Abstracts the graph backend behind typed upserts and traversals, so the
//! recommendation scoring is testable without a live graph engine. All
//! writes are idempotent upserts keyed by relational ids; the accumulation
//! operations are the only non-idempotent mutations, and the sync
//! coordinator guarantees they are applied at most once per completion.

use crate::graph::edge::{EdgeKind, GraphNode};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Relational facts projected into the graph for one appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentProjection {
    /// The idempotency key for every write in this projection
    pub appointment_id: String,
    pub customer_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: String,
}

/// A customer's accumulated preference for a service
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePreference {
    pub service_id: String,
    /// Sum of satisfaction scores across completions
    pub strength: f64,
    /// Number of completions that contributed
    pub count: i64,
}

/// A customer contributing preference strength toward a service
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerPreference {
    pub customer_id: String,
    pub strength: f64,
    pub count: i64,
}

/// A service related to another (complement, alternative, sequential)
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedService {
    pub service_id: String,
    pub strength: f64,
}

/// A staff member qualified for a service
#[derive(Debug, Clone, PartialEq)]
pub struct Specialist {
    pub staff_id: String,
    pub name: String,
    pub expertise_level: f64,
}

/// Running satisfaction history between a customer and a staff member
#[derive(Debug, Clone, PartialEq)]
pub struct WorkedWith {
    pub satisfaction: f64,
    pub count: i64,
}

/// Statistics about the preference graph
#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    pub total_nodes: u64,
    pub total_edges: u64,
    pub edges_by_kind: Vec<(EdgeKind, u64)>,
    pub average_edge_strength: f64,
}

/// Graph persistence trait
///
/// Only the sync coordinator writes through this trait; the recommender
/// uses the traversal reads exclusively.
#[async_trait]
pub trait GraphStore: Send + Sync {
    // ========== Node Operations ==========

    /// Insert or update a node, overwriting the label
    async fn upsert_node(&self, node: &GraphNode) -> Result<()>;

    /// Get a node's display label
    async fn node_label(&self, id: &str) -> Result<Option<String>>;

    // ========== Projection Writes ==========

    /// Project one appointment: nodes plus BOOKED / ASSIGNED_TO /
    /// FOR_SERVICE edges. Idempotent; retries cannot duplicate anything.
    async fn project_appointment(&self, projection: &AppointmentProjection) -> Result<()>;

    /// Accumulate preference: strength += satisfaction, count += 1
    async fn record_preference(
        &self,
        customer_id: &str,
        service_id: &str,
        satisfaction: f64,
    ) -> Result<()>;

    /// Update the running staff satisfaction average:
    /// avg = (old_avg + satisfaction) / 2, count += 1
    async fn record_staff_feedback(
        &self,
        customer_id: &str,
        staff_id: &str,
        satisfaction: f64,
    ) -> Result<()>;

    /// Set a staff member's expertise level for a service (curated, not
    /// learned)
    async fn set_specialization(
        &self,
        staff_id: &str,
        service_id: &str,
        expertise_level: f64,
    ) -> Result<()>;

    /// Link two services with a curated relation. Symmetric kinds are
    /// stored in both directions.
    async fn link_services(
        &self,
        service_id: &str,
        other_service_id: &str,
        kind: EdgeKind,
        strength: f64,
    ) -> Result<()>;

    // ========== Traversal Reads ==========

    /// Services a customer prefers, with accumulated strength
    async fn preferred_services(&self, customer_id: &str) -> Result<Vec<ServicePreference>>;

    /// Customers who prefer a service, with their strength toward it
    async fn customers_preferring(&self, service_id: &str) -> Result<Vec<CustomerPreference>>;

    /// Services related to the given one through the given edge kind
    async fn related_services(
        &self,
        service_id: &str,
        kind: EdgeKind,
    ) -> Result<Vec<RelatedService>>;

    /// Staff with a specialization edge to the service
    async fn specialists_for(&self, service_id: &str) -> Result<Vec<Specialist>>;

    /// The customer's satisfaction history with a staff member, if any
    async fn worked_with(&self, customer_id: &str, staff_id: &str) -> Result<Option<WorkedWith>>;

    // ========== Statistics ==========

    /// Get graph statistics
    async fn stats(&self) -> Result<GraphStats>;

    /// Check the backing store is reachable
    async fn health_check(&self) -> Result<()>;
}
