//! Infrastructure Layer
//!
//! Contains implementations of the domain contracts:
//! - PostgreSQL sessions and repositories
//! - The in-process store
//! - Prometheus metrics

pub mod database;
pub mod memory;
pub mod metrics;
pub mod repositories;
