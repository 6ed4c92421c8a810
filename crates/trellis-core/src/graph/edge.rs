//! Graph node and edge types
//!
//! Nodes mirror relational identities; edges carry the relationship
//! weights the recommender traverses.

use serde::{Deserialize, Serialize};

/// Kinds of nodes in the preference graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Customer,
    Staff,
    Service,
    Appointment,
}

impl NodeKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
            Self::Service => "service",
            Self::Appointment => "appointment",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Self::Customer),
            "staff" => Some(Self::Staff),
            "service" => Some(Self::Service),
            "appointment" => Some(Self::Appointment),
            _ => None,
        }
    }
}

/// A node in the preference graph
///
/// The id equals the relational id of the entity it mirrors, which is what
/// makes every projection write an idempotent upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    /// Display name, used for deterministic tie-breaks in recommendations
    pub label: String,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
        }
    }
}

/// Types of edges between graph nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Customer favors a service; strength is the accumulated satisfaction
    /// sum, count the number of completions
    Prefers,
    /// Customer has worked with a staff member; strength is a running
    /// satisfaction average
    WorkedWith,
    /// Staff member is qualified for a service; strength is the expertise
    /// level, edited explicitly rather than learned
    SpecializesIn,
    /// Two services are commonly booked together (author-curated, symmetric)
    Complements,
    /// Two services substitute for each other (symmetric)
    AlternativeTo,
    /// One service is commonly followed by another (directed)
    Sequential,
    /// Customer booked an appointment
    Booked,
    /// Appointment is assigned to a staff member
    AssignedTo,
    /// Appointment is for a service
    ForService,
}

impl EdgeKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prefers => "prefers",
            Self::WorkedWith => "worked_with",
            Self::SpecializesIn => "specializes_in",
            Self::Complements => "complements",
            Self::AlternativeTo => "alternative_to",
            Self::Sequential => "sequential",
            Self::Booked => "booked",
            Self::AssignedTo => "assigned_to",
            Self::ForService => "for_service",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prefers" => Some(Self::Prefers),
            "worked_with" => Some(Self::WorkedWith),
            "specializes_in" => Some(Self::SpecializesIn),
            "complements" => Some(Self::Complements),
            "alternative_to" => Some(Self::AlternativeTo),
            "sequential" => Some(Self::Sequential),
            "booked" => Some(Self::Booked),
            "assigned_to" => Some(Self::AssignedTo),
            "for_service" => Some(Self::ForService),
            _ => None,
        }
    }

    /// Symmetric edges are stored in both directions
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::Complements | Self::AlternativeTo)
    }

    /// Get all edge kinds
    pub fn all() -> &'static [EdgeKind] {
        &[
            Self::Prefers,
            Self::WorkedWith,
            Self::SpecializesIn,
            Self::Complements,
            Self::AlternativeTo,
            Self::Sequential,
            Self::Booked,
            Self::AssignedTo,
            Self::ForService,
        ]
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_kind_parse_roundtrip() {
        for kind in EdgeKind::all() {
            assert_eq!(EdgeKind::parse(kind.as_str()), Some(*kind));
        }
        assert_eq!(EdgeKind::parse("unknown"), None);
    }

    #[test]
    fn test_symmetric_kinds() {
        assert!(EdgeKind::Complements.is_symmetric());
        assert!(EdgeKind::AlternativeTo.is_symmetric());
        assert!(!EdgeKind::Sequential.is_symmetric());
        assert!(!EdgeKind::Prefers.is_symmetric());
        assert!(!EdgeKind::WorkedWith.is_symmetric());
    }

    #[test]
    fn test_node_kind_parse() {
        assert_eq!(NodeKind::parse("customer"), Some(NodeKind::Customer));
        assert_eq!(NodeKind::parse("appointment"), Some(NodeKind::Appointment));
        assert_eq!(NodeKind::parse("nope"), None);
    }
}
