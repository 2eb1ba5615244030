//! Driving port for device mutations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::AuthenticatedDeviceIdentity;
use crate::domain::{DeviceStatusReport, Error, UserId};

/// Soft-delete one of the caller's devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveDeviceRequest {
    pub user_id: UserId,
    pub device_id: String,
}

/// Status report submitted by an authenticated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateDeviceStatusRequest {
    /// Identity resolved from the bearer token.
    pub device: AuthenticatedDeviceIdentity,
    /// Device id claimed in the request body.
    pub device_id: String,
    pub report: DeviceStatusReport,
}

/// Outcome of a status report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatusUpdated {
    pub device_id: String,
    pub updated_at: DateTime<Utc>,
}

/// Driving port for device management.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceCommand: Send + Sync {
    /// Deactivate the device, revoking its bearer token.
    async fn remove_device(&self, request: RemoveDeviceRequest) -> Result<(), Error>;

    /// Record battery and firmware details reported by the device itself.
    async fn update_status(
        &self,
        request: UpdateDeviceStatusRequest,
    ) -> Result<DeviceStatusUpdated, Error>;
}
