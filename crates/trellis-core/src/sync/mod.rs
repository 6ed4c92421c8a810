//! Dual-store synchronization
//!
//! The relational store is the source of truth; the graph is a derived
//! projection. The coordinator applies graph writes after the relational
//! commit and never propagates graph failures back to the caller. Writes
//! that fail land in a relational outbox and are retried with bounded
//! attempts.

pub mod coordinator;
pub mod outbox;

pub use coordinator::SyncCoordinator;
pub use outbox::{OutboxEntry, OutboxOp, OutboxRepository, OutboxStatus};
