//! Catalog layer
//!
//! Customers, staff, and services. The relational store is authoritative
//! for all catalog identity; the graph projection only mirrors ids.

pub mod customer;
pub mod service;
pub mod staff;

pub use customer::{Customer, CustomerRepository};
pub use service::{Service, ServiceRepository};
pub use staff::{Staff, StaffRepository};
