//! SQLite-backed graph store
//!
//! Adjacency rows in `graph_edges` with a `(source, target, type)` primary
//! key: every write is an `INSERT ... ON CONFLICT DO UPDATE`, which is what
//! makes retried projections safe.

use crate::graph::edge::{EdgeKind, GraphNode, NodeKind};
use crate::graph::store::{
    AppointmentProjection, CustomerPreference, GraphStats, GraphStore, RelatedService,
    ServicePreference, Specialist, WorkedWith,
};
use crate::storage::Database;
use crate::Result;
use async_trait::async_trait;
use sqlx::Row;

/// Graph store over its own SQLite database, independent of the relational
/// store
#[derive(Debug, Clone)]
pub struct SqliteGraphStore {
    db: Database,
}

impl SqliteGraphStore {
    /// Create a graph store over an already-opened graph database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Ensure a node row exists without touching an existing label
    async fn ensure_node(&self, id: &str, kind: NodeKind) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO graph_nodes (id, kind, label) VALUES (?, ?, '')")
            .bind(id)
            .bind(kind.as_str())
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Upsert a structural edge with a fixed weight
    async fn upsert_edge(&self, source: &str, target: &str, kind: EdgeKind) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO graph_edges (source_id, target_id, edge_type, strength, count)
            VALUES (?, ?, ?, 1.0, 1)
            ON CONFLICT (source_id, target_id, edge_type)
            DO UPDATE SET updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(source)
        .bind(target)
        .bind(kind.as_str())
        .execute(self.db.pool())
        .await?;
        Ok(())
    }
}

#[async_trait]
impl GraphStore for SqliteGraphStore {
    async fn upsert_node(&self, node: &GraphNode) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO graph_nodes (id, kind, label)
            VALUES (?, ?, ?)
            ON CONFLICT (id)
            DO UPDATE SET label = excluded.label, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&node.id)
        .bind(node.kind.as_str())
        .bind(&node.label)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn node_label(&self, id: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT label FROM graph_nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.map(|r| r.get("label")))
    }

    async fn project_appointment(&self, projection: &AppointmentProjection) -> Result<()> {
        self.ensure_node(&projection.customer_id, NodeKind::Customer)
            .await?;
        self.ensure_node(&projection.staff_id, NodeKind::Staff)
            .await?;
        self.ensure_node(&projection.service_id, NodeKind::Service)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO graph_nodes (id, kind, label)
            VALUES (?, 'appointment', ?)
            ON CONFLICT (id)
            DO UPDATE SET label = excluded.label, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&projection.appointment_id)
        .bind(&projection.status)
        .execute(self.db.pool())
        .await?;

        self.upsert_edge(
            &projection.customer_id,
            &projection.appointment_id,
            EdgeKind::Booked,
        )
        .await?;
        self.upsert_edge(
            &projection.appointment_id,
            &projection.staff_id,
            EdgeKind::AssignedTo,
        )
        .await?;
        self.upsert_edge(
            &projection.appointment_id,
            &projection.service_id,
            EdgeKind::ForService,
        )
        .await?;

        tracing::debug!(
            appointment_id = %projection.appointment_id,
            "Projected appointment into graph"
        );
        Ok(())
    }

    async fn record_preference(
        &self,
        customer_id: &str,
        service_id: &str,
        satisfaction: f64,
    ) -> Result<()> {
        self.ensure_node(customer_id, NodeKind::Customer).await?;
        self.ensure_node(service_id, NodeKind::Service).await?;

        sqlx::query(
            r#"
            INSERT INTO graph_edges (source_id, target_id, edge_type, strength, count)
            VALUES (?, ?, 'prefers', ?, 1)
            ON CONFLICT (source_id, target_id, edge_type)
            DO UPDATE SET strength = strength + excluded.strength,
                          count = count + 1,
                          updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(customer_id)
        .bind(service_id)
        .bind(satisfaction)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn record_staff_feedback(
        &self,
        customer_id: &str,
        staff_id: &str,
        satisfaction: f64,
    ) -> Result<()> {
        self.ensure_node(customer_id, NodeKind::Customer).await?;
        self.ensure_node(staff_id, NodeKind::Staff).await?;

        // Running average with old value defaulting to 0, so the first
        // completion lands at satisfaction / 2
        sqlx::query(
            r#"
            INSERT INTO graph_edges (source_id, target_id, edge_type, strength, count)
            VALUES (?, ?, 'worked_with', ?, 1)
            ON CONFLICT (source_id, target_id, edge_type)
            DO UPDATE SET strength = (strength + ?) / 2.0,
                          count = count + 1,
                          updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(customer_id)
        .bind(staff_id)
        .bind(satisfaction / 2.0)
        .bind(satisfaction)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn set_specialization(
        &self,
        staff_id: &str,
        service_id: &str,
        expertise_level: f64,
    ) -> Result<()> {
        self.ensure_node(staff_id, NodeKind::Staff).await?;
        self.ensure_node(service_id, NodeKind::Service).await?;

        sqlx::query(
            r#"
            INSERT INTO graph_edges (source_id, target_id, edge_type, strength, count)
            VALUES (?, ?, 'specializes_in', ?, 1)
            ON CONFLICT (source_id, target_id, edge_type)
            DO UPDATE SET strength = excluded.strength, updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(staff_id)
        .bind(service_id)
        .bind(expertise_level)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    async fn link_services(
        &self,
        service_id: &str,
        other_service_id: &str,
        kind: EdgeKind,
        strength: f64,
    ) -> Result<()> {
        self.ensure_node(service_id, NodeKind::Service).await?;
        self.ensure_node(other_service_id, NodeKind::Service).await?;

        let mut pairs = vec![(service_id, other_service_id)];
        if kind.is_symmetric() {
            pairs.push((other_service_id, service_id));
        }

        for (source, target) in pairs {
            sqlx::query(
                r#"
                INSERT INTO graph_edges (source_id, target_id, edge_type, strength, count)
                VALUES (?, ?, ?, ?, 1)
                ON CONFLICT (source_id, target_id, edge_type)
                DO UPDATE SET strength = excluded.strength, updated_at = CURRENT_TIMESTAMP
                "#,
            )
            .bind(source)
            .bind(target)
            .bind(kind.as_str())
            .bind(strength)
            .execute(self.db.pool())
            .await?;
        }
        Ok(())
    }

    async fn preferred_services(&self, customer_id: &str) -> Result<Vec<ServicePreference>> {
        let rows = sqlx::query(
            "SELECT target_id, strength, count FROM graph_edges
             WHERE source_id = ? AND edge_type = 'prefers'",
        )
        .bind(customer_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ServicePreference {
                service_id: r.get("target_id"),
                strength: r.get("strength"),
                count: r.get("count"),
            })
            .collect())
    }

    async fn customers_preferring(&self, service_id: &str) -> Result<Vec<CustomerPreference>> {
        let rows = sqlx::query(
            "SELECT source_id, strength, count FROM graph_edges
             WHERE target_id = ? AND edge_type = 'prefers'",
        )
        .bind(service_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CustomerPreference {
                customer_id: r.get("source_id"),
                strength: r.get("strength"),
                count: r.get("count"),
            })
            .collect())
    }

    async fn related_services(
        &self,
        service_id: &str,
        kind: EdgeKind,
    ) -> Result<Vec<RelatedService>> {
        let rows = sqlx::query(
            "SELECT target_id, strength FROM graph_edges
             WHERE source_id = ? AND edge_type = ?",
        )
        .bind(service_id)
        .bind(kind.as_str())
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| RelatedService {
                service_id: r.get("target_id"),
                strength: r.get("strength"),
            })
            .collect())
    }

    async fn specialists_for(&self, service_id: &str) -> Result<Vec<Specialist>> {
        let rows = sqlx::query(
            "SELECT e.source_id, e.strength, COALESCE(n.label, '') AS label
             FROM graph_edges e
             LEFT JOIN graph_nodes n ON n.id = e.source_id
             WHERE e.target_id = ? AND e.edge_type = 'specializes_in'",
        )
        .bind(service_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Specialist {
                staff_id: r.get("source_id"),
                name: r.get("label"),
                expertise_level: r.get("strength"),
            })
            .collect())
    }

    async fn worked_with(&self, customer_id: &str, staff_id: &str) -> Result<Option<WorkedWith>> {
        let row = sqlx::query(
            "SELECT strength, count FROM graph_edges
             WHERE source_id = ? AND target_id = ? AND edge_type = 'worked_with'",
        )
        .bind(customer_id)
        .bind(staff_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| WorkedWith {
            satisfaction: r.get("strength"),
            count: r.get("count"),
        }))
    }

    async fn stats(&self) -> Result<GraphStats> {
        let (total_nodes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_nodes")
            .fetch_one(self.db.pool())
            .await?;
        let (total_edges,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_edges")
            .fetch_one(self.db.pool())
            .await?;
        let (average_edge_strength,): (Option<f64>,) =
            sqlx::query_as("SELECT AVG(strength) FROM graph_edges")
                .fetch_one(self.db.pool())
                .await?;

        let rows = sqlx::query(
            "SELECT edge_type, COUNT(*) AS n FROM graph_edges GROUP BY edge_type ORDER BY n DESC",
        )
        .fetch_all(self.db.pool())
        .await?;
        let edges_by_kind = rows
            .into_iter()
            .filter_map(|r| {
                EdgeKind::parse(r.get("edge_type")).map(|kind| (kind, r.get::<i64, _>("n") as u64))
            })
            .collect();

        Ok(GraphStats {
            total_nodes: total_nodes as u64,
            total_edges: total_edges as u64,
            edges_by_kind,
            average_edge_strength: average_edge_strength.unwrap_or(0.0),
        })
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(self.db.pool()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Schema;
    use chrono::Utc;

    async fn store() -> SqliteGraphStore {
        let db = Database::in_memory(Schema::Graph).await.unwrap();
        SqliteGraphStore::new(db)
    }

    fn projection(appointment_id: &str) -> AppointmentProjection {
        AppointmentProjection {
            appointment_id: appointment_id.to_string(),
            customer_id: "c1".to_string(),
            staff_id: "s1".to_string(),
            service_id: "srv1".to_string(),
            start_time: Utc::now(),
            end_time: Utc::now() + chrono::Duration::hours(1),
            status: "confirmed".to_string(),
        }
    }

    #[tokio::test]
    async fn test_preference_accumulates() {
        let store = store().await;

        store.record_preference("c1", "srv1", 0.8).await.unwrap();
        store.record_preference("c1", "srv1", 0.6).await.unwrap();

        let prefs = store.preferred_services("c1").await.unwrap();
        assert_eq!(prefs.len(), 1);
        assert!((prefs[0].strength - 1.4).abs() < 1e-9);
        assert_eq!(prefs[0].count, 2);
    }

    #[tokio::test]
    async fn test_staff_feedback_running_average() {
        let store = store().await;

        // First completion: (0 + 1.0) / 2 = 0.5
        store.record_staff_feedback("c1", "s1", 1.0).await.unwrap();
        let first = store.worked_with("c1", "s1").await.unwrap().unwrap();
        assert!((first.satisfaction - 0.5).abs() < 1e-9);
        assert_eq!(first.count, 1);

        // Second completion: (0.5 + 0.9) / 2 = 0.7
        store.record_staff_feedback("c1", "s1", 0.9).await.unwrap();
        let second = store.worked_with("c1", "s1").await.unwrap().unwrap();
        assert!((second.satisfaction - 0.7).abs() < 1e-9);
        assert_eq!(second.count, 2);
    }

    #[tokio::test]
    async fn test_project_appointment_idempotent() {
        let store = store().await;

        store.project_appointment(&projection("a1")).await.unwrap();
        store.project_appointment(&projection("a1")).await.unwrap();

        let stats = store.stats().await.unwrap();
        // 4 nodes (customer, staff, service, appointment), 3 edges
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.total_edges, 3);
    }

    #[tokio::test]
    async fn test_symmetric_complements() {
        let store = store().await;

        store
            .link_services("srv1", "srv2", EdgeKind::Complements, 0.8)
            .await
            .unwrap();

        let from_1 = store
            .related_services("srv1", EdgeKind::Complements)
            .await
            .unwrap();
        let from_2 = store
            .related_services("srv2", EdgeKind::Complements)
            .await
            .unwrap();
        assert_eq!(from_1.len(), 1);
        assert_eq!(from_2.len(), 1);
        assert_eq!(from_1[0].service_id, "srv2");
        assert_eq!(from_2[0].service_id, "srv1");
    }

    #[tokio::test]
    async fn test_sequential_is_directed() {
        let store = store().await;

        store
            .link_services("srv1", "srv2", EdgeKind::Sequential, 0.7)
            .await
            .unwrap();

        assert_eq!(
            store
                .related_services("srv1", EdgeKind::Sequential)
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(store
            .related_services("srv2", EdgeKind::Sequential)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_specialization_is_set_not_accumulated() {
        let store = store().await;

        store.set_specialization("s1", "srv1", 3.0).await.unwrap();
        store.set_specialization("s1", "srv1", 5.0).await.unwrap();

        let specialists = store.specialists_for("srv1").await.unwrap();
        assert_eq!(specialists.len(), 1);
        assert_eq!(specialists[0].expertise_level, 5.0);
    }

    #[tokio::test]
    async fn test_node_label_upsert() {
        let store = store().await;

        store
            .upsert_node(&GraphNode::new("s1", NodeKind::Staff, "Sara"))
            .await
            .unwrap();
        assert_eq!(
            store.node_label("s1").await.unwrap(),
            Some("Sara".to_string())
        );

        // ensure_node must not clobber a real label
        store.set_specialization("s1", "srv1", 2.0).await.unwrap();
        assert_eq!(
            store.node_label("s1").await.unwrap(),
            Some("Sara".to_string())
        );
    }
}
