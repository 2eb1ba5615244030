//! HTTP inbound adapter exposing REST endpoints.

pub mod admission;
pub mod client_identity;
pub mod device_auth;
pub mod devices;
pub mod envelope;
pub mod error;
pub mod health;
pub mod pairing;
pub mod routes;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;

pub use error::ApiResult;
