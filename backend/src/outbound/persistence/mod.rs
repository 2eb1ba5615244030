//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the pairing and device
//! repository ports backed by PostgreSQL via the Diesel ORM with async
//! support through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel rows and domain types. Lifecycle rules live in the domain.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Conditional writes**: every status change filters on the expected
//!   current state, so concurrent claims and expiries resolve in the database.
//!
//! # Example
//!
//! ```ignore
//! use runsight_backend::outbound::persistence::{
//!     DbPool, DieselPairingRepository, PoolConfig, run_migrations,
//! };
//!
//! run_migrations("postgres://localhost/runsight").await?;
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/runsight")).await?;
//! let repo = DieselPairingRepository::new(pool);
//! ```

mod diesel_device_repository;
mod diesel_pairing_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_device_repository::DieselDeviceRepository;
pub use diesel_pairing_repository::DieselPairingRepository;
pub use migrations::run_migrations;
pub use pool::{DbPool, PoolConfig, PoolError};
