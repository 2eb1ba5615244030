//! Runsight backend: device pairing and per-client admission control for
//! run-tracking wearables.
//!
//! The crate follows a hexagonal layout. [`domain`] holds the pairing and
//! admission logic behind ports, [`inbound`] exposes it over HTTP, and
//! [`outbound`] provides the PostgreSQL, in-memory, and entropy adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
