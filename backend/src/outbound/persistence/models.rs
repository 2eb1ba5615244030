//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{devices, pairing_sessions};

/// Row struct for reading from the pairing_sessions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = pairing_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PairingSessionRow {
    pub id: String,
    pub user_id: Uuid,
    pub code: String,
    pub device_id: Option<String>,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub paired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for newly issued sessions.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pairing_sessions)]
pub(crate) struct NewPairingSessionRow<'a> {
    pub id: &'a str,
    pub user_id: Uuid,
    pub code: &'a str,
    pub status: &'a str,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the devices table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = devices)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeviceRow {
    pub device_id: String,
    pub user_id: Uuid,
    pub device_name: String,
    pub device_type: String,
    pub firmware_version: Option<String>,
    pub hardware_version: Option<String>,
    pub mac_address: Option<String>,
    pub is_active: bool,
    pub paired_at: DateTime<Utc>,
    pub battery_level: Option<i16>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Insertable struct for devices created by a claim.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = devices)]
pub(crate) struct NewDeviceRow<'a> {
    pub device_id: &'a str,
    pub user_id: Uuid,
    pub device_name: &'a str,
    pub device_type: &'a str,
    pub firmware_version: Option<&'a str>,
    pub hardware_version: Option<&'a str>,
    pub mac_address: Option<&'a str>,
    pub token_digest: &'a str,
    pub is_active: bool,
    pub paired_at: DateTime<Utc>,
}

/// Changeset applied by a device status report.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = devices)]
pub(crate) struct DeviceStatusChangeset<'a> {
    pub battery_level: Option<i16>,
    pub firmware_version: Option<&'a str>,
    pub last_sync_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
