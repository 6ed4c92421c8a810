//! Preference graph
//!
//! A derived, eventually-consistent projection of booking and feedback
//! events. The relational store remains the source of truth; everything
//! here can be rebuilt from appointment history. The graph store is only
//! ever mutated through the sync coordinator; the recommender is read-only.

pub mod edge;
pub mod recommend;
pub mod sqlite;
pub mod store;

pub use edge::{EdgeKind, GraphNode, NodeKind};
pub use recommend::{Recommender, ServiceRecommendation, StaffRecommendation};
pub use sqlite::SqliteGraphStore;
pub use store::{
    AppointmentProjection, CustomerPreference, GraphStats, GraphStore, RelatedService,
    ServicePreference, Specialist, WorkedWith,
};
