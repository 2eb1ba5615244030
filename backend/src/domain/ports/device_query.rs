//! Driving port for device reads and bearer-token authentication.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Device, Error, UserId};

/// Client-facing view of a paired device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSummary {
    pub device_id: String,
    pub device_name: String,
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firmware_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    pub is_active: bool,
    pub paired_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl From<&Device> for DeviceSummary {
    fn from(device: &Device) -> Self {
        Self {
            device_id: device.device_id().as_str().to_owned(),
            device_name: device.device_name().to_owned(),
            device_type: device.device_type().to_owned(),
            firmware_version: device.firmware_version().map(str::to_owned),
            hardware_version: device.hardware_version().map(str::to_owned),
            mac_address: device.mac_address().map(str::to_owned),
            is_active: device.is_active(),
            paired_at: device.paired_at(),
            battery_level: device.battery_level(),
            last_sync_at: device.last_sync_at(),
        }
    }
}

/// Active devices owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDevicesResponse {
    pub devices: Vec<DeviceSummary>,
}

/// Identity of a device that presented a valid bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedDeviceIdentity {
    pub device_id: String,
    pub user_id: UserId,
}

/// Driving port for device reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceQuery: Send + Sync {
    /// List the caller's active devices.
    async fn list_devices(&self, user_id: UserId) -> Result<ListDevicesResponse, Error>;

    /// Resolve a bearer token to an active device.
    async fn authenticate(&self, token: String) -> Result<AuthenticatedDeviceIdentity, Error>;
}
