//! Integer token bucket.
//!
//! Levels are tracked in micro-tokens so fractional refill accumulates
//! without floating point.

use chrono::{DateTime, Utc};

use super::AdmissionPolicy;

/// Micro-tokens per whole token.
const UNITS: u128 = 1_000_000;

/// Refillable token count for one client key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucket {
    level: u128,
    // Scaled elapsed time not yet converted into a whole micro-token.
    carry: u128,
    last_refill: DateTime<Utc>,
}

fn capacity(policy: &AdmissionPolicy) -> u128 {
    u128::from(policy.burst()) * UNITS
}

impl TokenBucket {
    /// A bucket at full capacity, as seen by a new client.
    #[must_use]
    pub fn full(policy: &AdmissionPolicy, now: DateTime<Utc>) -> Self {
        Self {
            level: capacity(policy),
            carry: 0,
            last_refill: now,
        }
    }

    /// Whole tokens currently available.
    #[must_use]
    pub fn tokens(&self) -> u32 {
        u32::try_from(self.level.checked_div(UNITS).unwrap_or(0)).unwrap_or(u32::MAX)
    }

    /// Whether the bucket holds its full capacity.
    #[must_use]
    pub fn is_full(&self, policy: &AdmissionPolicy) -> bool {
        self.level >= capacity(policy)
    }

    /// Credit tokens for the time elapsed since the last refill, capped at
    /// capacity.
    ///
    /// The division remainder is carried into the next refill, so the
    /// credited total never drifts from `elapsed * rate`. A clock that moves
    /// backwards credits nothing.
    pub fn refill(&mut self, policy: &AdmissionPolicy, now: DateTime<Utc>) {
        let cap = capacity(policy);
        if self.level >= cap {
            self.level = cap;
            self.carry = 0;
            self.last_refill = now;
            return;
        }
        let elapsed_us = (now - self.last_refill)
            .num_microseconds()
            .unwrap_or(i64::MAX);
        let Ok(elapsed_us) = u128::try_from(elapsed_us) else {
            return;
        };
        let period_us = policy.refill_period().as_micros();
        let scaled = elapsed_us
            .saturating_mul(u128::from(policy.refill_tokens()) * UNITS)
            .saturating_add(self.carry);
        let added = scaled.checked_div(period_us).unwrap_or(0);
        self.carry = scaled.checked_rem(period_us).unwrap_or(0);
        self.level = self.level.saturating_add(added).min(cap);
        if self.level == cap {
            self.carry = 0;
        }
        self.last_refill = now;
    }

    /// Refill, then debit one token if available.
    pub fn try_acquire(&mut self, policy: &AdmissionPolicy, now: DateTime<Utc>) -> bool {
        self.refill(policy, now);
        if self.level >= UNITS {
            self.level -= UNITS;
            true
        } else {
            false
        }
    }
}
