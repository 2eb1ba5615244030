//! Driving port for polling a pairing session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, UserId};

use super::DeviceSummary;

/// Status poll from the session owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingStatusRequest {
    pub session_id: String,
    pub user_id: UserId,
}

/// Snapshot of a pairing session as seen by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingStatusResponse {
    pub paired: bool,
    pub expired: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceSummary>,
}

impl PairingStatusResponse {
    /// Still waiting for a device.
    #[must_use]
    pub const fn pending(remaining_seconds: u64) -> Self {
        Self {
            paired: false,
            expired: false,
            remaining_seconds: Some(remaining_seconds),
            device: None,
        }
    }

    /// Lapsed without a claim.
    #[must_use]
    pub const fn expired() -> Self {
        Self {
            paired: false,
            expired: true,
            remaining_seconds: None,
            device: None,
        }
    }

    /// Claimed by `device`.
    #[must_use]
    pub const fn paired(device: DeviceSummary) -> Self {
        Self {
            paired: true,
            expired: false,
            remaining_seconds: None,
            device: Some(device),
        }
    }
}

/// Driving port for pairing status reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PairingQuery: Send + Sync {
    /// Report the session's state, expiring it lazily when its deadline has
    /// passed.
    async fn status(&self, request: PairingStatusRequest) -> Result<PairingStatusResponse, Error>;
}
