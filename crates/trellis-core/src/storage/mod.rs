//! Storage layer
//!
//! SQLite-backed persistence. The relational store (appointments of record,
//! catalog) and the graph projection live in separate databases with
//! independent pools and migration sets; the relational store is the source
//! of truth.

pub mod database;
pub mod migrations;

pub use database::{Database, DatabaseConfig, Schema};
