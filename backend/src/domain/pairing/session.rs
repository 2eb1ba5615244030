//! Pairing session aggregate and its lifecycle.
//!
//! A session is issued `pending`, then moves exactly once to either `paired`
//! (claimed by a device before expiry) or `expired` (observed after expiry).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};

use super::{PairingCode, PairingSessionId};
use crate::domain::{DeviceId, UserId};

/// Lifetime of a freshly issued pairing session.
pub const PAIRING_TTL_SECONDS: i64 = 300;

/// [`PAIRING_TTL_SECONDS`] as a [`TimeDelta`].
#[must_use]
pub fn pairing_ttl() -> TimeDelta {
    TimeDelta::seconds(PAIRING_TTL_SECONDS)
}

/// Lifecycle state of a pairing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairingStatus {
    /// Waiting for a device to present the code.
    Pending,
    /// Claimed by a device. Terminal.
    Paired,
    /// Lapsed without a claim. Terminal.
    Expired,
}

impl PairingStatus {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paired => "paired",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for PairingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status text read from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown pairing status: {0}")]
pub struct ParsePairingStatusError(pub String);

impl FromStr for PairingStatus {
    type Err = ParsePairingStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paired" => Ok(Self::Paired),
            "expired" => Ok(Self::Expired),
            other => Err(ParsePairingStatusError(other.to_owned())),
        }
    }
}

/// Rejected lifecycle transitions and inconsistent stored rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairingTransitionError {
    /// Only pending sessions may change state.
    #[error("pairing session is already {0}")]
    NotPending(PairingStatus),
    /// A claim arrived at or after the expiry instant.
    #[error("pairing session has expired")]
    Lapsed,
    /// A session cannot be expired before its deadline.
    #[error("pairing session has not reached its deadline")]
    NotLapsed,
    /// Paired sessions must carry a device and a pairing time, others neither.
    #[error("pairing session device binding does not match its status")]
    InconsistentBinding,
    /// The deadline precedes the creation time.
    #[error("pairing session expires before it was created")]
    InvalidWindow,
}

/// Stored fields used to rebuild a [`PairingSession`].
#[derive(Debug, Clone)]
pub struct PairingSessionDraft {
    /// Session identifier.
    pub id: PairingSessionId,
    /// Owning user.
    pub user_id: UserId,
    /// Pairing code.
    pub code: PairingCode,
    /// Lifecycle state.
    pub status: PairingStatus,
    /// Device bound by the claim, when paired.
    pub device_id: Option<DeviceId>,
    /// Absolute deadline.
    pub expires_at: DateTime<Utc>,
    /// Claim time, when paired.
    pub paired_at: Option<DateTime<Utc>>,
    /// Issue time.
    pub created_at: DateTime<Utc>,
}

/// Short-lived offer by a user to pair a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingSession {
    id: PairingSessionId,
    user_id: UserId,
    code: PairingCode,
    status: PairingStatus,
    device_id: Option<DeviceId>,
    expires_at: DateTime<Utc>,
    paired_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl PairingSession {
    /// Issue a new pending session expiring [`PAIRING_TTL_SECONDS`] after `now`.
    #[must_use]
    pub fn issue(
        id: PairingSessionId,
        user_id: UserId,
        code: PairingCode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            code,
            status: PairingStatus::Pending,
            device_id: None,
            expires_at: now + pairing_ttl(),
            paired_at: None,
            created_at: now,
        }
    }

    /// Rebuild a session from storage, checking the status/binding invariant.
    ///
    /// # Errors
    /// Returns [`PairingTransitionError::InconsistentBinding`] when a paired
    /// session lacks its device or a non-paired one carries one, and
    /// [`PairingTransitionError::InvalidWindow`] when the deadline precedes
    /// creation.
    pub fn restore(draft: PairingSessionDraft) -> Result<Self, PairingTransitionError> {
        let PairingSessionDraft {
            id,
            user_id,
            code,
            status,
            device_id,
            expires_at,
            paired_at,
            created_at,
        } = draft;
        let bound = device_id.is_some() && paired_at.is_some();
        let unbound = device_id.is_none() && paired_at.is_none();
        let consistent = match status {
            PairingStatus::Paired => bound,
            PairingStatus::Pending | PairingStatus::Expired => unbound,
        };
        if !consistent {
            return Err(PairingTransitionError::InconsistentBinding);
        }
        if expires_at < created_at {
            return Err(PairingTransitionError::InvalidWindow);
        }
        Ok(Self {
            id,
            user_id,
            code,
            status,
            device_id,
            expires_at,
            paired_at,
            created_at,
        })
    }

    /// Session identifier.
    #[must_use]
    pub const fn id(&self) -> &PairingSessionId {
        &self.id
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Pairing code.
    #[must_use]
    pub const fn code(&self) -> &PairingCode {
        &self.code
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> PairingStatus {
        self.status
    }

    /// Device bound by the claim.
    #[must_use]
    pub const fn device_id(&self) -> Option<&DeviceId> {
        self.device_id.as_ref()
    }

    /// Absolute deadline.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Claim time.
    #[must_use]
    pub const fn paired_at(&self) -> Option<DateTime<Utc>> {
        self.paired_at
    }

    /// Issue time.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Pending and strictly before the deadline.
    #[must_use]
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.status == PairingStatus::Pending && now < self.expires_at
    }

    /// Still recorded as pending although the deadline has passed.
    #[must_use]
    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == PairingStatus::Pending && now >= self.expires_at
    }

    /// Whole seconds left before expiry, rounded down and never negative.
    #[must_use]
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> u64 {
        let left = (self.expires_at - now).num_seconds();
        u64::try_from(left).unwrap_or(0)
    }

    /// Move a lapsed pending session to `expired`.
    ///
    /// # Errors
    /// Fails when the session is not pending or has not reached its deadline.
    pub fn expire(self, now: DateTime<Utc>) -> Result<Self, PairingTransitionError> {
        if self.status != PairingStatus::Pending {
            return Err(PairingTransitionError::NotPending(self.status));
        }
        if !self.is_lapsed(now) {
            return Err(PairingTransitionError::NotLapsed);
        }
        Ok(Self {
            status: PairingStatus::Expired,
            ..self
        })
    }

    /// Bind `device_id` to a claimable session.
    ///
    /// # Errors
    /// Fails when the session is not pending or `now` is at or past expiry.
    pub fn claim(
        self,
        device_id: DeviceId,
        now: DateTime<Utc>,
    ) -> Result<Self, PairingTransitionError> {
        if self.status != PairingStatus::Pending {
            return Err(PairingTransitionError::NotPending(self.status));
        }
        if !self.is_claimable(now) {
            return Err(PairingTransitionError::Lapsed);
        }
        Ok(Self {
            status: PairingStatus::Paired,
            device_id: Some(device_id),
            paired_at: Some(now),
            ..self
        })
    }
}
