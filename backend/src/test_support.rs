//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with the
//! `test-support` feature.

mod clock;
mod random;
pub mod session;

pub use clock::MutableClock;
pub use random::ScriptedRandomSource;
