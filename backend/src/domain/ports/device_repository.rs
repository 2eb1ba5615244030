//! Port for device credential persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Device, DeviceId, DeviceStatusReport, TokenDigest, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by device repository adapters.
    pub enum DeviceRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "device repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "device repository query failed: {message}",
    }
}

/// Port for reading devices and revoking them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeviceRepository: Send + Sync {
    /// Whether any device, active or not, uses `device_id`.
    async fn exists(&self, device_id: &DeviceId) -> Result<bool, DeviceRepositoryError>;

    /// Fetch a device by id regardless of its active flag.
    async fn find_by_id(&self, device_id: &DeviceId)
    -> Result<Option<Device>, DeviceRepositoryError>;

    /// Fetch the active device whose bearer token hashes to `digest`.
    async fn find_active_by_token_digest(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<Device>, DeviceRepositoryError>;

    /// Active devices owned by `owner`, most recently paired first.
    async fn list_active_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Device>, DeviceRepositoryError>;

    /// Clear the active flag of `device_id` if `owner` holds it and it is
    /// still active. Returns whether a row changed.
    async fn deactivate(
        &self,
        device_id: &DeviceId,
        owner: &UserId,
    ) -> Result<bool, DeviceRepositoryError>;

    /// Apply a status report to `device_id` while it is active, stamping
    /// `at` as its last sync time. Returns whether a row changed.
    async fn record_status(
        &self,
        device_id: &DeviceId,
        report: &DeviceStatusReport,
        at: DateTime<Utc>,
    ) -> Result<bool, DeviceRepositoryError>;
}
