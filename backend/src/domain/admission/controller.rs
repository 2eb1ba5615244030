//! Concurrent bucket map keyed by client identity.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use mockable::Clock;
use tracing::debug;

use super::{AdmissionPolicy, TokenBucket};

/// Admit-or-reject decisions for one policy across many client keys.
///
/// `admit` holds the key's shard lock across lookup-or-create, refill, and
/// debit, and `sweep` takes the same locks, so a bucket is never evicted
/// mid-check and two requests never spend the same token.
pub struct AdmissionController {
    policy: AdmissionPolicy,
    buckets: DashMap<String, TokenBucket>,
    clock: Arc<dyn Clock>,
}

impl AdmissionController {
    /// Create a controller with no tracked clients.
    pub fn new(policy: AdmissionPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            buckets: DashMap::new(),
            clock,
        }
    }

    /// Policy applied to every key.
    #[must_use]
    pub const fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    /// Debit one token from `key`'s bucket; `false` means reject now.
    pub fn admit(&self, key: &str) -> bool {
        let now = self.clock.utc();
        if let Some(mut bucket) = self.buckets.get_mut(key) {
            return bucket.try_acquire(&self.policy, now);
        }
        let mut bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| TokenBucket::full(&self.policy, now));
        bucket.try_acquire(&self.policy, now)
    }

    /// Evict every bucket that has refilled to capacity; returns the count.
    pub fn sweep(&self) -> usize {
        let now = self.clock.utc();
        let mut evicted = 0_usize;
        self.buckets.retain(|_, bucket| {
            bucket.refill(&self.policy, now);
            let idle = bucket.is_full(&self.policy);
            if idle {
                evicted += 1;
            }
            !idle
        });
        evicted
    }

    /// Number of client keys currently tracked.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}

/// Sweep `controller` every `every` until the task is dropped.
///
/// The interval's immediate first tick is skipped.
pub async fn run_sweeper(controller: Arc<AdmissionController>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let evicted = controller.sweep();
        debug!(
            policy = %controller.policy().kind(),
            evicted,
            remaining = controller.tracked_keys(),
            "admission sweep finished"
        );
    }
}
