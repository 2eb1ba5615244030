//! Driving port for pairing mutations: issuing codes and claiming them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DeviceConfig, DeviceRegistration, Error, UserId};

/// Request a fresh pairing code for a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPairingCodeRequest {
    pub user_id: UserId,
}

/// Newly issued pairing code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPairingCodeResponse {
    pub code: String,
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: u64,
}

/// Device presenting a pairing code.
///
/// `code` is kept raw so malformed input is reported exactly like an unknown
/// code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPairingCodeRequest {
    pub code: String,
    pub registration: DeviceRegistration,
}

/// Credential issued to a device by a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPairingCodeResponse {
    pub device_token: String,
    pub user_id: UserId,
    pub config: DeviceConfig,
}

/// Driving port for the pairing workflow.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PairingCommand: Send + Sync {
    /// Issue a new pending session with a unique six-digit code.
    async fn request_code(
        &self,
        request: RequestPairingCodeRequest,
    ) -> Result<RequestPairingCodeResponse, Error>;

    /// Claim the session holding the code and register the device.
    async fn verify_code(
        &self,
        request: VerifyPairingCodeRequest,
    ) -> Result<VerifyPairingCodeResponse, Error>;
}
