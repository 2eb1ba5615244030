//! Actix middleware shared by every route.
//!
//! [`Trace`] wraps the whole app so that admission rejections, handler errors
//! and probe responses all carry a `trace-id` header.

pub mod trace;

pub use trace::Trace;
