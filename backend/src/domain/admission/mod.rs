//! Per-client admission control.
//!
//! Each [`AdmissionController`] owns one token bucket per client key. Buckets
//! are created lazily at full capacity and evicted by a periodic sweep once
//! they have refilled completely.

mod bucket;
mod controller;
mod policy;

pub use self::bucket::TokenBucket;
pub use self::controller::{AdmissionController, run_sweeper};
pub use self::policy::{
    AdmissionPolicy, AdmissionPolicyError, LENIENT_RETRY_AFTER, PolicyKind, STRICT_BURST,
    STRICT_RETRY_AFTER,
};
