//! Graph-based recommendations
//!
//! Collaborative filtering over the preference graph: customers who prefer
//! the same services as you are "similar", and the services they prefer
//! that you have not tried yet become candidates. Curated complement links
//! widen the candidate set without inflating scores.
//!
//! Recommendation reads are advisory. Any graph failure degrades to an
//! empty result instead of surfacing an error to the booking path.

use crate::graph::edge::EdgeKind;
use crate::graph::store::GraphStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A recommended service with its collaborative score
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecommendation {
    pub service_id: String,
    pub name: String,
    /// Sum of similar customers' preference strengths toward this service
    /// plus the number of distinct contributors
    pub score: f64,
    /// Distinct similar customers who contributed to the score
    pub recommended_by: i64,
}

/// A recommended staff member for a service
#[derive(Debug, Clone, PartialEq)]
pub struct StaffRecommendation {
    pub staff_id: String,
    pub name: String,
    pub expertise_level: f64,
    /// The customer's own satisfaction average with this staff member,
    /// when history exists
    pub personal_satisfaction: Option<f64>,
    pub score: f64,
}

/// Read-only recommendation queries over a graph store
#[derive(Clone)]
pub struct Recommender {
    graph: Arc<dyn GraphStore>,
}

impl Recommender {
    pub fn new(graph: Arc<dyn GraphStore>) -> Self {
        Self { graph }
    }

    /// Recommend services the customer has not tried, scored by what
    /// similar customers prefer
    ///
    /// Score for a candidate service is the sum of preference strengths
    /// that similar customers hold toward it plus the number of distinct
    /// contributors, so broad support counts alongside raw strength.
    /// Complements of the customer's own preferred services enter the
    /// candidate set at score zero unless similar customers also back
    /// them.
    pub async fn recommend_services(
        &self,
        customer_id: &str,
        limit: usize,
    ) -> Vec<ServiceRecommendation> {
        match self.score_services(customer_id).await {
            Ok(mut candidates) => {
                candidates.truncate(limit);
                candidates
            }
            Err(e) => {
                tracing::warn!(customer_id, error = %e, "Service recommendation query failed");
                Vec::new()
            }
        }
    }

    async fn score_services(&self, customer_id: &str) -> crate::Result<Vec<ServiceRecommendation>> {
        let own = self.graph.preferred_services(customer_id).await?;
        let own_ids: HashSet<String> = own.iter().map(|p| p.service_id.clone()).collect();

        // Similar customers share at least one preferred service
        let mut similar: HashSet<String> = HashSet::new();
        for pref in &own {
            for other in self.graph.customers_preferring(&pref.service_id).await? {
                if other.customer_id != customer_id {
                    similar.insert(other.customer_id);
                }
            }
        }

        // candidate -> (score, distinct contributors)
        let mut scores: HashMap<String, (f64, HashSet<String>)> = HashMap::new();
        for other_id in &similar {
            for pref in self.graph.preferred_services(other_id).await? {
                if own_ids.contains(&pref.service_id) {
                    continue;
                }
                let entry = scores
                    .entry(pref.service_id)
                    .or_insert_with(|| (0.0, HashSet::new()));
                entry.0 += pref.strength;
                entry.1.insert(other_id.clone());
            }
        }

        // Complements widen the candidate set but contribute no strength
        for pref in &own {
            for related in self
                .graph
                .related_services(&pref.service_id, EdgeKind::Complements)
                .await?
            {
                if !own_ids.contains(&related.service_id) {
                    scores
                        .entry(related.service_id)
                        .or_insert_with(|| (0.0, HashSet::new()));
                }
            }
        }

        let mut out = Vec::with_capacity(scores.len());
        for (service_id, (strength, contributors)) in scores {
            let name = self
                .graph
                .node_label(&service_id)
                .await?
                .unwrap_or_default();
            out.push(ServiceRecommendation {
                service_id,
                name,
                score: strength + contributors.len() as f64,
                recommended_by: contributors.len() as i64,
            });
        }

        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.recommended_by.cmp(&a.recommended_by))
                .then(a.name.cmp(&b.name))
        });
        Ok(out)
    }

    /// Recommend staff for a service: specialists ranked by expertise, with
    /// the customer's own history with each one folded in when known
    pub async fn recommend_staff(
        &self,
        service_id: &str,
        customer_id: Option<&str>,
    ) -> Vec<StaffRecommendation> {
        match self.score_staff(service_id, customer_id).await {
            Ok(ranked) => ranked,
            Err(e) => {
                tracing::warn!(service_id, error = %e, "Staff recommendation query failed");
                Vec::new()
            }
        }
    }

    async fn score_staff(
        &self,
        service_id: &str,
        customer_id: Option<&str>,
    ) -> crate::Result<Vec<StaffRecommendation>> {
        let specialists = self.graph.specialists_for(service_id).await?;

        let mut out = Vec::with_capacity(specialists.len());
        for specialist in specialists {
            let personal = match customer_id {
                Some(cid) => self
                    .graph
                    .worked_with(cid, &specialist.staff_id)
                    .await?
                    .map(|w| w.satisfaction),
                None => None,
            };
            let score = specialist.expertise_level + personal.unwrap_or(0.0);
            out.push(StaffRecommendation {
                staff_id: specialist.staff_id,
                name: specialist.name,
                expertise_level: specialist.expertise_level,
                personal_satisfaction: personal,
                score,
            });
        }

        out.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.name.cmp(&b.name))
        });
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edge::{GraphNode, NodeKind};
    use crate::graph::sqlite::SqliteGraphStore;
    use crate::storage::{Database, Schema};

    async fn recommender() -> (Recommender, Arc<SqliteGraphStore>) {
        let db = Database::in_memory(Schema::Graph).await.unwrap();
        let store = Arc::new(SqliteGraphStore::new(db));
        (Recommender::new(store.clone()), store)
    }

    async fn name_service(store: &SqliteGraphStore, id: &str, name: &str) {
        store
            .upsert_node(&GraphNode::new(id, NodeKind::Service, name))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recommends_what_similar_customers_prefer() {
        let (rec, store) = recommender().await;
        name_service(&store, "massage", "Massage").await;
        name_service(&store, "facial", "Facial").await;

        // alice and bob both prefer massage; bob also prefers facial
        store.record_preference("alice", "massage", 0.9).await.unwrap();
        store.record_preference("bob", "massage", 0.8).await.unwrap();
        store.record_preference("bob", "facial", 0.7).await.unwrap();

        let recs = rec.recommend_services("alice", 5).await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].service_id, "facial");
        // Strength 0.7 plus one contributor
        assert!((recs[0].score - 1.7).abs() < 1e-9);
        assert_eq!(recs[0].recommended_by, 1);
    }

    #[tokio::test]
    async fn test_never_recommends_already_preferred() {
        let (rec, store) = recommender().await;
        store.record_preference("alice", "massage", 0.9).await.unwrap();
        store.record_preference("bob", "massage", 0.8).await.unwrap();

        let recs = rec.recommend_services("alice", 5).await;
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn test_contributors_counted_distinctly() {
        let (rec, store) = recommender().await;
        store.record_preference("alice", "massage", 0.9).await.unwrap();
        for other in ["bob", "carol"] {
            store.record_preference(other, "massage", 0.5).await.unwrap();
            store.record_preference(other, "facial", 0.6).await.unwrap();
        }

        let recs = rec.recommend_services("alice", 5).await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].recommended_by, 2);
        // Strength 1.2 plus two contributors
        assert!((recs[0].score - 3.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_broad_support_outranks_raw_strength() {
        let (rec, store) = recommender().await;
        store.record_preference("alice", "massage", 0.9).await.unwrap();

        // Two similar customers back the facial weakly, one backs the spa
        // strongly: 1.2 + 2 contributors beats 2.0 + 1
        for other in ["bob", "carol"] {
            store.record_preference(other, "massage", 0.5).await.unwrap();
            store.record_preference(other, "facial", 0.6).await.unwrap();
        }
        store.record_preference("dave", "massage", 0.5).await.unwrap();
        store.record_preference("dave", "spa", 2.0).await.unwrap();

        let recs = rec.recommend_services("alice", 5).await;
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].service_id, "facial");
        assert!((recs[0].score - 3.2).abs() < 1e-9);
        assert_eq!(recs[1].service_id, "spa");
        assert!((recs[1].score - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_complements_enter_at_zero() {
        let (rec, store) = recommender().await;
        name_service(&store, "sauna", "Sauna").await;
        store.record_preference("alice", "massage", 0.9).await.unwrap();
        store
            .link_services("massage", "sauna", EdgeKind::Complements, 0.8)
            .await
            .unwrap();

        let recs = rec.recommend_services("alice", 5).await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].service_id, "sauna");
        assert_eq!(recs[0].score, 0.0);
    }

    #[tokio::test]
    async fn test_limit_applied_after_ranking() {
        let (rec, store) = recommender().await;
        store.record_preference("alice", "massage", 0.9).await.unwrap();
        store.record_preference("bob", "massage", 0.5).await.unwrap();
        store.record_preference("bob", "facial", 0.9).await.unwrap();
        store.record_preference("bob", "sauna", 0.3).await.unwrap();

        let recs = rec.recommend_services("alice", 1).await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].service_id, "facial");
    }

    #[tokio::test]
    async fn test_staff_ranked_by_expertise_and_history() {
        let (rec, store) = recommender().await;
        store
            .upsert_node(&GraphNode::new("s1", NodeKind::Staff, "Sara"))
            .await
            .unwrap();
        store
            .upsert_node(&GraphNode::new("s2", NodeKind::Staff, "Anna"))
            .await
            .unwrap();
        store.set_specialization("s1", "massage", 3.0).await.unwrap();
        store.set_specialization("s2", "massage", 4.0).await.unwrap();

        // Without history Anna leads on expertise
        let recs = rec.recommend_staff("massage", None).await;
        assert_eq!(recs[0].staff_id, "s2");
        assert_eq!(recs[0].personal_satisfaction, None);

        // Three completions at 1.0 leave Alice's average with Sara at
        // 0.875, so 3.0 + 0.875 still trails Anna's 4.0
        store.record_staff_feedback("alice", "s1", 1.0).await.unwrap();
        store.record_staff_feedback("alice", "s1", 1.0).await.unwrap();
        store.record_staff_feedback("alice", "s1", 1.0).await.unwrap();
        let recs = rec.recommend_staff("massage", Some("alice")).await;
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].staff_id, "s2");
        assert_eq!(recs[1].staff_id, "s1");
        assert!((recs[1].score - 3.875).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_customer_gets_empty_result() {
        let (rec, _store) = recommender().await;
        assert!(rec.recommend_services("nobody", 5).await.is_empty());
        assert!(rec.recommend_staff("nothing", None).await.is_empty());
    }
}
