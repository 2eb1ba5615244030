//! Paired devices and their bearer credentials.
//!
//! A device is created exactly once, at the moment a pairing session is
//! claimed. Its bearer token is handed to the device once and only a SHA-256
//! digest is retained.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::UserId;
use crate::domain::ports::{RandomSource, RandomSourceError};

/// Maximum length of a device identifier or device type.
pub const DEVICE_ID_MAX: usize = 50;
/// Maximum length of firmware and hardware version strings.
pub const VERSION_MAX: usize = 20;
/// Number of random bytes behind a bearer token (64 hex characters).
pub const DEVICE_TOKEN_BYTES: usize = 32;
/// Highest battery level a device may report, in percent.
pub const BATTERY_LEVEL_MAX: u8 = 100;

/// Validation failures for device registration input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceValidationError {
    /// A required field was blank.
    #[error("{field} must not be empty")]
    Missing {
        /// Offending field name (camelCase, as seen by clients).
        field: &'static str,
    },
    /// A field exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong {
        /// Offending field name.
        field: &'static str,
        /// Maximum permitted length.
        max: usize,
    },
    /// The MAC address was not six colon- or dash-separated hex octets.
    #[error("macAddress must look like AA:BB:CC:DD:EE:FF")]
    MacAddress,
    /// A battery level above 100 percent.
    #[error("batteryLevel must be between 0 and 100")]
    BatteryLevel,
}

impl DeviceValidationError {
    /// Client-facing field the error refers to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::TooLong { field, .. } => field,
            Self::MacAddress => "macAddress",
            Self::BatteryLevel => "batteryLevel",
        }
    }
}

fn bounded(
    field: &'static str,
    value: String,
    max: usize,
) -> Result<String, DeviceValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeviceValidationError::Missing { field });
    }
    if trimmed.chars().count() > max {
        return Err(DeviceValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

fn optional_bounded(
    field: &'static str,
    value: Option<String>,
    max: usize,
) -> Result<Option<String>, DeviceValidationError> {
    match value {
        Some(raw) if !raw.trim().is_empty() => bounded(field, raw, max).map(Some),
        _ => Ok(None),
    }
}

fn is_mac_address(value: &str) -> bool {
    let separator = if value.contains(':') { ':' } else { '-' };
    let octets: Vec<&str> = value.split(separator).collect();
    octets.len() == 6
        && octets
            .iter()
            .all(|octet| octet.len() == 2 && octet.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Caller-supplied device identifier, unique across all devices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate a device identifier.
    ///
    /// # Errors
    /// Returns [`DeviceValidationError`] when blank or longer than 50 characters.
    pub fn new(raw: impl Into<String>) -> Result<Self, DeviceValidationError> {
        bounded("deviceId", raw.into(), DEVICE_ID_MAX).map(Self)
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded SHA-256 digest of a bearer token, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenDigest(String);

impl TokenDigest {
    /// Digest a presented bearer token.
    #[must_use]
    pub fn of(token: &str) -> Self {
        Self(hex::encode(Sha256::digest(token.as_bytes())))
    }

    /// Wrap a digest read back from storage.
    #[must_use]
    pub const fn from_stored(hex_digest: String) -> Self {
        Self(hex_digest)
    }

    /// Borrow the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Freshly minted bearer token; the plaintext is wiped on drop.
pub struct DeviceToken(Zeroizing<String>);

impl DeviceToken {
    /// Draw 32 random bytes and hex-encode them.
    ///
    /// # Errors
    /// Propagates failures from the random source.
    pub fn generate(random: &dyn RandomSource) -> Result<Self, RandomSourceError> {
        let mut bytes = Zeroizing::new([0_u8; DEVICE_TOKEN_BYTES]);
        random.fill_bytes(bytes.as_mut())?;
        Ok(Self(Zeroizing::new(hex::encode(bytes.as_ref()))))
    }

    /// Reveal the token text; only the verify response should call this.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Digest suitable for storage and lookup.
    #[must_use]
    pub fn digest(&self) -> TokenDigest {
        TokenDigest::of(self.expose())
    }
}

impl fmt::Debug for DeviceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeviceToken([redacted])")
    }
}

/// Unvalidated registration fields as received from a device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRegistrationDraft {
    /// Device identifier.
    pub device_id: String,
    /// Device type, e.g. `smart_glasses`.
    pub device_type: String,
    /// Optional firmware version.
    pub firmware_version: Option<String>,
    /// Optional hardware revision.
    pub hardware_version: Option<String>,
    /// Optional MAC address.
    pub mac_address: Option<String>,
}

/// Validated device registration details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRegistration {
    device_id: DeviceId,
    device_type: String,
    firmware_version: Option<String>,
    hardware_version: Option<String>,
    mac_address: Option<String>,
}

impl DeviceRegistration {
    /// Validate a registration draft.
    ///
    /// # Errors
    /// Returns the first [`DeviceValidationError`] encountered.
    pub fn new(draft: DeviceRegistrationDraft) -> Result<Self, DeviceValidationError> {
        let DeviceRegistrationDraft {
            device_id,
            device_type,
            firmware_version,
            hardware_version,
            mac_address,
        } = draft;
        let mac_address = optional_bounded("macAddress", mac_address, 17)
            .map_err(|_| DeviceValidationError::MacAddress)?;
        if mac_address.as_deref().is_some_and(|mac| !is_mac_address(mac)) {
            return Err(DeviceValidationError::MacAddress);
        }
        Ok(Self {
            device_id: DeviceId::new(device_id)?,
            device_type: bounded("deviceType", device_type, DEVICE_ID_MAX)?,
            firmware_version: optional_bounded("firmwareVersion", firmware_version, VERSION_MAX)?,
            hardware_version: optional_bounded("hardwareVersion", hardware_version, VERSION_MAX)?,
            mac_address,
        })
    }

    /// Device identifier.
    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }
}

/// Persisted device record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    device_id: DeviceId,
    user_id: UserId,
    device_name: String,
    device_type: String,
    firmware_version: Option<String>,
    hardware_version: Option<String>,
    mac_address: Option<String>,
    is_active: bool,
    paired_at: DateTime<Utc>,
    battery_level: Option<u8>,
    last_sync_at: Option<DateTime<Utc>>,
}

/// Field bundle used to rebuild a [`Device`] from storage.
#[derive(Debug, Clone)]
pub struct DeviceDraft {
    /// Device identifier.
    pub device_id: DeviceId,
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub device_name: String,
    /// Device type.
    pub device_type: String,
    /// Firmware version.
    pub firmware_version: Option<String>,
    /// Hardware revision.
    pub hardware_version: Option<String>,
    /// MAC address.
    pub mac_address: Option<String>,
    /// Soft-delete marker.
    pub is_active: bool,
    /// Claim time.
    pub paired_at: DateTime<Utc>,
    /// Last reported battery level.
    pub battery_level: Option<u8>,
    /// Last status report time.
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Device {
    /// Build the active device created by a successful claim.
    ///
    /// The display name starts out as the device identifier.
    #[must_use]
    pub fn register(
        registration: DeviceRegistration,
        owner: UserId,
        paired_at: DateTime<Utc>,
    ) -> Self {
        let DeviceRegistration {
            device_id,
            device_type,
            firmware_version,
            hardware_version,
            mac_address,
        } = registration;
        Self {
            device_name: device_id.as_str().to_owned(),
            device_id,
            user_id: owner,
            device_type,
            firmware_version,
            hardware_version,
            mac_address,
            is_active: true,
            paired_at,
            battery_level: None,
            last_sync_at: None,
        }
    }

    /// Rebuild a device from stored fields.
    #[must_use]
    pub fn from_draft(draft: DeviceDraft) -> Self {
        let DeviceDraft {
            device_id,
            user_id,
            device_name,
            device_type,
            firmware_version,
            hardware_version,
            mac_address,
            is_active,
            paired_at,
            battery_level,
            last_sync_at,
        } = draft;
        Self {
            device_id,
            user_id,
            device_name,
            device_type,
            firmware_version,
            hardware_version,
            mac_address,
            is_active,
            paired_at,
            battery_level,
            last_sync_at,
        }
    }

    /// Device identifier.
    #[must_use]
    pub const fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Display name.
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Device type.
    #[must_use]
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    /// Firmware version, if reported.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    /// Hardware revision, if reported.
    #[must_use]
    pub fn hardware_version(&self) -> Option<&str> {
        self.hardware_version.as_deref()
    }

    /// MAC address, if reported.
    #[must_use]
    pub fn mac_address(&self) -> Option<&str> {
        self.mac_address.as_deref()
    }

    /// Whether the credential is still usable.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// When the device was paired.
    #[must_use]
    pub const fn paired_at(&self) -> DateTime<Utc> {
        self.paired_at
    }

    /// Last reported battery level in percent.
    #[must_use]
    pub const fn battery_level(&self) -> Option<u8> {
        self.battery_level
    }

    /// When the device last reported its status.
    #[must_use]
    pub const fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.last_sync_at
    }

    /// Soft-delete the device, revoking its token.
    pub const fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Apply a status report received at `at`.
    ///
    /// Fields the report leaves out keep their stored values.
    pub fn record_status(&mut self, report: &DeviceStatusReport, at: DateTime<Utc>) {
        if let Some(level) = report.battery_level() {
            self.battery_level = Some(level);
        }
        if let Some(firmware) = report.firmware_version() {
            self.firmware_version = Some(firmware.to_owned());
        }
        self.last_sync_at = Some(at);
    }
}

/// Validated periodic status report sent by a paired device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStatusReport {
    battery_level: Option<u8>,
    firmware_version: Option<String>,
}

impl DeviceStatusReport {
    /// Validate a status report.
    ///
    /// A blank firmware version counts as absent.
    ///
    /// # Errors
    /// Returns [`DeviceValidationError::BatteryLevel`] above 100 percent and
    /// [`DeviceValidationError::TooLong`] for an oversized firmware version.
    pub fn new(
        battery_level: Option<u8>,
        firmware_version: Option<String>,
    ) -> Result<Self, DeviceValidationError> {
        if battery_level.is_some_and(|level| level > BATTERY_LEVEL_MAX) {
            return Err(DeviceValidationError::BatteryLevel);
        }
        Ok(Self {
            battery_level,
            firmware_version: optional_bounded("firmwareVersion", firmware_version, VERSION_MAX)?,
        })
    }

    /// Reported battery level in percent.
    #[must_use]
    pub const fn battery_level(&self) -> Option<u8> {
        self.battery_level
    }

    /// Reported firmware version.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }
}

/// Upload settings handed to a device after pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Seconds between run uploads.
    pub upload_interval_seconds: u32,
    /// Runs per upload batch.
    pub batch_size: u32,
    /// Whether uploads are compressed.
    pub compression_enabled: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            upload_interval_seconds: 300,
            batch_size: 10,
            compression_enabled: true,
        }
    }
}
