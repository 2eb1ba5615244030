//! Admission policies: bucket shape plus the rejection they produce.

use std::fmt;
use std::time::Duration;

use crate::domain::{Error, ErrorCode};

/// Burst size of every strict policy.
pub const STRICT_BURST: u32 = 2;
/// Retry hint attached to lenient rejections.
pub const LENIENT_RETRY_AFTER: Duration = Duration::from_secs(60);
/// Retry hint attached to strict rejections.
pub const STRICT_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Which family a policy belongs to; selects the rejection error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Global policy applied to all traffic.
    Lenient,
    /// Tighter policy for sensitive endpoints.
    Strict,
}

impl PolicyKind {
    /// Label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected policy parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmissionPolicyError {
    /// Refill amount was zero.
    #[error("refill rate must be positive")]
    ZeroRate,
    /// Burst capacity was zero.
    #[error("burst must be positive")]
    ZeroBurst,
    /// Refill period was zero.
    #[error("refill period must be positive")]
    ZeroPeriod,
}

/// Token bucket shape: `refill_tokens` are added every `refill_period`,
/// continuously, up to `burst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    kind: PolicyKind,
    refill_tokens: u32,
    refill_period: Duration,
    burst: u32,
    retry_after: Duration,
}

impl AdmissionPolicy {
    /// Build a policy from explicit parameters.
    ///
    /// # Errors
    /// Returns [`AdmissionPolicyError`] if the rate, period, or burst is zero.
    pub fn new(
        kind: PolicyKind,
        refill_tokens: u32,
        refill_period: Duration,
        burst: u32,
        retry_after: Duration,
    ) -> Result<Self, AdmissionPolicyError> {
        if refill_tokens == 0 {
            return Err(AdmissionPolicyError::ZeroRate);
        }
        if refill_period.is_zero() {
            return Err(AdmissionPolicyError::ZeroPeriod);
        }
        if burst == 0 {
            return Err(AdmissionPolicyError::ZeroBurst);
        }
        Ok(Self {
            kind,
            refill_tokens,
            refill_period,
            burst,
            retry_after,
        })
    }

    /// Global policy: `per_second` sustained with the given burst.
    ///
    /// # Errors
    /// Returns [`AdmissionPolicyError`] for zero parameters.
    ///
    /// # Examples
    /// ```
    /// use runsight_backend::domain::admission::AdmissionPolicy;
    ///
    /// let policy = AdmissionPolicy::lenient(100, 200).expect("valid policy");
    /// assert_eq!(policy.burst(), 200);
    /// assert_eq!(policy.retry_after().as_secs(), 60);
    /// ```
    pub fn lenient(per_second: u32, burst: u32) -> Result<Self, AdmissionPolicyError> {
        Self::new(
            PolicyKind::Lenient,
            per_second,
            Duration::from_secs(1),
            burst,
            LENIENT_RETRY_AFTER,
        )
    }

    /// Sensitive-endpoint policy: `per_minute` sustained, burst of
    /// [`STRICT_BURST`].
    ///
    /// # Errors
    /// Returns [`AdmissionPolicyError::ZeroRate`] when `per_minute` is zero.
    pub fn strict(per_minute: u32) -> Result<Self, AdmissionPolicyError> {
        Self::new(
            PolicyKind::Strict,
            per_minute,
            Duration::from_secs(60),
            STRICT_BURST,
            STRICT_RETRY_AFTER,
        )
    }

    /// Policy family.
    #[must_use]
    pub const fn kind(&self) -> PolicyKind {
        self.kind
    }

    /// Tokens added per refill period.
    #[must_use]
    pub const fn refill_tokens(&self) -> u32 {
        self.refill_tokens
    }

    /// Refill period.
    #[must_use]
    pub const fn refill_period(&self) -> Duration {
        self.refill_period
    }

    /// Bucket capacity.
    #[must_use]
    pub const fn burst(&self) -> u32 {
        self.burst
    }

    /// Retry hint for rejected callers.
    #[must_use]
    pub const fn retry_after(&self) -> Duration {
        self.retry_after
    }

    /// Error reported to a rejected caller.
    #[must_use]
    pub fn rejection(&self) -> Error {
        let (code, message) = match self.kind {
            PolicyKind::Lenient => (ErrorCode::RateLimitExceeded, "rate limit exceeded"),
            PolicyKind::Strict => (
                ErrorCode::StrictRateLimitExceeded,
                "too many requests to a sensitive endpoint",
            ),
        };
        Error::rate_limited(code, message, self.retry_after)
    }
}
