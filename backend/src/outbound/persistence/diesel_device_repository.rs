//! PostgreSQL-backed `DeviceRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{DeviceRepository, DeviceRepositoryError};
use crate::domain::{Device, DeviceDraft, DeviceId, DeviceStatusReport, TokenDigest, UserId};

use super::error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{DeviceRow, DeviceStatusChangeset};
use super::pool::{DbPool, PoolError};
use super::schema::devices;

/// Diesel-backed implementation of the device repository port.
#[derive(Clone)]
pub struct DieselDeviceRepository {
    pool: DbPool,
}

impl DieselDeviceRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DeviceRepositoryError {
    map_basic_pool_error(error, DeviceRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> DeviceRepositoryError {
    map_basic_diesel_error(
        error,
        DeviceRepositoryError::query,
        DeviceRepositoryError::connection,
    )
}

fn row_to_device(row: DeviceRow) -> Result<Device, DeviceRepositoryError> {
    let DeviceRow {
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
    } = row;
    let device_id = DeviceId::new(device_id)
        .map_err(|err| DeviceRepositoryError::query(format!("invalid devices row: {err}")))?;
    let battery_level = battery_level
        .map(u8::try_from)
        .transpose()
        .map_err(|err| DeviceRepositoryError::query(format!("invalid battery level: {err}")))?;

    Ok(Device::from_draft(DeviceDraft {
        device_id,
        user_id: UserId::from_uuid(user_id),
        device_name,
        device_type,
        firmware_version,
        hardware_version,
        mac_address,
        is_active,
        paired_at,
        battery_level,
        last_sync_at,
    }))
}

#[async_trait]
impl DeviceRepository for DieselDeviceRepository {
    async fn exists(&self, device_id: &DeviceId) -> Result<bool, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        diesel::select(diesel::dsl::exists(
            devices::table.filter(devices::device_id.eq(device_id.as_str())),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = devices::table
            .filter(devices::device_id.eq(device_id.as_str()))
            .select(DeviceRow::as_select())
            .first::<DeviceRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_device).transpose()
    }

    async fn find_active_by_token_digest(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = devices::table
            .filter(
                devices::token_digest
                    .eq(digest.as_str())
                    .and(devices::is_active.eq(true)),
            )
            .select(DeviceRow::as_select())
            .first::<DeviceRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_device).transpose()
    }

    async fn list_active_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Device>, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<DeviceRow> = devices::table
            .filter(
                devices::user_id
                    .eq(owner.as_uuid())
                    .and(devices::is_active.eq(true)),
            )
            .order(devices::paired_at.desc())
            .select(DeviceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_device).collect()
    }

    async fn deactivate(
        &self,
        device_id: &DeviceId,
        owner: &UserId,
    ) -> Result<bool, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            devices::table.filter(
                devices::device_id
                    .eq(device_id.as_str())
                    .and(devices::user_id.eq(owner.as_uuid()))
                    .and(devices::is_active.eq(true)),
            ),
        )
        .set((
            devices::is_active.eq(false),
            devices::updated_at.eq(Utc::now()),
        ))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn record_status(
        &self,
        device_id: &DeviceId,
        report: &DeviceStatusReport,
        at: DateTime<Utc>,
    ) -> Result<bool, DeviceRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changes = DeviceStatusChangeset {
            battery_level: report.battery_level().map(i16::from),
            firmware_version: report.firmware_version(),
            last_sync_at: at,
            updated_at: at,
        };
        let updated = diesel::update(
            devices::table.filter(
                devices::device_id
                    .eq(device_id.as_str())
                    .and(devices::is_active.eq(true)),
            ),
        )
        .set(&changes)
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }
}
