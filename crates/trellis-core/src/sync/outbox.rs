//! Graph outbox
//!
//! Queue of graph writes that failed at commit time, stored in the
//! relational database so they survive restarts. Every queued operation is
//! an idempotent upsert or a guarded accumulation, so replaying an entry
//! is safe.

use crate::graph::edge::GraphNode;
use crate::graph::store::AppointmentProjection;
use crate::storage::Database;
use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// A deferred graph write
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OutboxOp {
    UpsertNode {
        node: GraphNode,
    },
    ProjectAppointment {
        projection: AppointmentProjection,
    },
    RecordPreference {
        customer_id: String,
        service_id: String,
        satisfaction: f64,
    },
    RecordStaffFeedback {
        customer_id: String,
        staff_id: String,
        satisfaction: f64,
    },
}

impl OutboxOp {
    /// Short tag for the `op` column, for operators reading the table
    pub fn tag(&self) -> &'static str {
        match self {
            Self::UpsertNode { .. } => "upsert_node",
            Self::ProjectAppointment { .. } => "project_appointment",
            Self::RecordPreference { .. } => "record_preference",
            Self::RecordStaffFeedback { .. } => "record_staff_feedback",
        }
    }
}

/// Outbox entry status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Dead,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dead => "dead",
        }
    }
}

/// A row in the graph outbox
#[derive(Debug, Clone)]
pub struct OutboxEntry {
    pub id: String,
    pub op: OutboxOp,
    pub attempts: i64,
    pub last_error: Option<String>,
}

/// Repository for the graph outbox table
pub struct OutboxRepository<'a> {
    db: &'a Database,
}

impl<'a> OutboxRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Queue a failed graph write for later retry
    pub async fn enqueue(&self, op: &OutboxOp, error: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(op)
            .map_err(|e| crate::Error::Other(format!("Failed to serialize outbox op: {}", e)))?;

        sqlx::query(
            "INSERT INTO graph_outbox (id, op, payload, attempts, last_error) VALUES (?, ?, ?, 0, ?)",
        )
        .bind(&id)
        .bind(op.tag())
        .bind(&payload)
        .bind(error)
        .execute(self.db.pool())
        .await?;

        tracing::warn!(outbox_id = %id, op = op.tag(), error, "Queued graph write for retry");
        Ok(id)
    }

    /// Pending entries, oldest first
    pub async fn list_pending(&self, limit: i64) -> Result<Vec<OutboxEntry>> {
        let rows = sqlx::query(
            "SELECT id, payload, attempts, last_error FROM graph_outbox
             WHERE status = 'pending' ORDER BY created_at, id LIMIT ?",
        )
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let payload: String = row.get("payload");
            let op = serde_json::from_str(&payload).map_err(|e| {
                crate::Error::Other(format!("Corrupt outbox payload: {}", e))
            })?;
            entries.push(OutboxEntry {
                id: row.get("id"),
                op,
                attempts: row.get("attempts"),
                last_error: row.get("last_error"),
            });
        }
        Ok(entries)
    }

    /// Remove an entry after its operation applied
    pub async fn mark_applied(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM graph_outbox WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    /// Record a failed attempt; entries that exhaust `max_attempts` are
    /// parked as dead and skipped by future flushes
    pub async fn record_failure(&self, id: &str, error: &str, max_attempts: i64) -> Result<()> {
        sqlx::query(
            "UPDATE graph_outbox
             SET attempts = attempts + 1,
                 last_error = ?,
                 status = CASE WHEN attempts + 1 >= ? THEN 'dead' ELSE 'pending' END,
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(error)
        .bind(max_attempts)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    /// Number of entries with the given status
    pub async fn count(&self, status: OutboxStatus) -> Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM graph_outbox WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(self.db.pool())
            .await?;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Schema;

    async fn db() -> Database {
        Database::in_memory(Schema::Relational).await.unwrap()
    }

    fn pref_op() -> OutboxOp {
        OutboxOp::RecordPreference {
            customer_id: "c1".to_string(),
            service_id: "srv1".to_string(),
            satisfaction: 0.8,
        }
    }

    #[tokio::test]
    async fn test_enqueue_and_list_roundtrip() {
        let db = db().await;
        let repo = OutboxRepository::new(&db);

        repo.enqueue(&pref_op(), "graph down").await.unwrap();
        let pending = repo.list_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 0);
        assert_eq!(pending[0].last_error.as_deref(), Some("graph down"));
        match &pending[0].op {
            OutboxOp::RecordPreference { service_id, .. } => assert_eq!(service_id, "srv1"),
            other => panic!("wrong op: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_applied_entries_are_removed() {
        let db = db().await;
        let repo = OutboxRepository::new(&db);

        let id = repo.enqueue(&pref_op(), "graph down").await.unwrap();
        repo.mark_applied(&id).await.unwrap();
        assert!(repo.list_pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_entries_go_dead() {
        let db = db().await;
        let repo = OutboxRepository::new(&db);

        let id = repo.enqueue(&pref_op(), "graph down").await.unwrap();
        repo.record_failure(&id, "still down", 2).await.unwrap();
        assert_eq!(repo.count(OutboxStatus::Pending).await.unwrap(), 1);

        repo.record_failure(&id, "still down", 2).await.unwrap();
        assert_eq!(repo.count(OutboxStatus::Pending).await.unwrap(), 0);
        assert_eq!(repo.count(OutboxStatus::Dead).await.unwrap(), 1);
        assert!(repo.list_pending(10).await.unwrap().is_empty());
    }
}
