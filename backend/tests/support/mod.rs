//! Shared helpers for integration suites that need PostgreSQL.
//!
//! Integration tests compile as separate crates, so suites pull these in with
//! `mod support;`.

pub mod cluster_skip;
pub mod embedded_postgres;

pub use cluster_skip::handle_cluster_setup_failure;
pub use embedded_postgres::{provision_template_database, shared_cluster};
