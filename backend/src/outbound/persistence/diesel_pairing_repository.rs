//! PostgreSQL-backed `PairingRepository` implementation using Diesel ORM.
//!
//! Session inserts and claims run in transactions. Pending-code uniqueness is
//! enforced by the `pairing_sessions_pending_code` partial unique index, and
//! every status change is conditional on the row still being `pending`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{PairingClaim, PairingRepository, PairingRepositoryError};
use crate::domain::{
    DeviceId, PairingCode, PairingSession, PairingSessionDraft, PairingSessionId, PairingStatus,
    UserId,
};

use super::error_mapping::{is_unique_violation, map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewDeviceRow, NewPairingSessionRow, PairingSessionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{devices, pairing_sessions};

const PENDING: &str = PairingStatus::Pending.as_str();
const PAIRED: &str = PairingStatus::Paired.as_str();
const EXPIRED: &str = PairingStatus::Expired.as_str();

/// Diesel-backed implementation of the pairing repository port.
#[derive(Clone)]
pub struct DieselPairingRepository {
    pool: DbPool,
}

impl DieselPairingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PairingRepositoryError {
    map_basic_pool_error(error, PairingRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PairingRepositoryError {
    map_basic_diesel_error(
        error,
        PairingRepositoryError::query,
        PairingRepositoryError::connection,
    )
}

fn map_insert_error(error: diesel::result::Error) -> PairingRepositoryError {
    if is_unique_violation(&error) {
        return PairingRepositoryError::code_collision();
    }
    map_diesel_error(error)
}

/// Failure inside the claim transaction.
enum ClaimError {
    /// The conditional session update matched no row.
    SessionUnavailable,
    Diesel(diesel::result::Error),
}

impl From<diesel::result::Error> for ClaimError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_claim_error(error: ClaimError) -> PairingRepositoryError {
    match error {
        ClaimError::SessionUnavailable => PairingRepositoryError::session_unavailable(),
        ClaimError::Diesel(error) if is_unique_violation(&error) => {
            PairingRepositoryError::device_conflict()
        }
        ClaimError::Diesel(error) => map_diesel_error(error),
    }
}

fn row_to_session(row: PairingSessionRow) -> Result<PairingSession, PairingRepositoryError> {
    let invalid = |err: &dyn std::fmt::Display| {
        PairingRepositoryError::query(format!("invalid pairing_sessions row: {err}"))
    };
    let PairingSessionRow {
        id,
        user_id,
        code,
        device_id,
        status,
        expires_at,
        paired_at,
        created_at,
    } = row;

    PairingSession::restore(PairingSessionDraft {
        id: PairingSessionId::new(id).map_err(|err| invalid(&err))?,
        user_id: UserId::from_uuid(user_id),
        code: PairingCode::parse(&code).map_err(|err| invalid(&err))?,
        status: status.parse::<PairingStatus>().map_err(|err| invalid(&err))?,
        device_id: device_id
            .map(DeviceId::new)
            .transpose()
            .map_err(|err| invalid(&err))?,
        expires_at,
        paired_at,
        created_at,
    })
    .map_err(|err| invalid(&err))
}

#[async_trait]
impl PairingRepository for DieselPairingRepository {
    async fn find_claimable_by_code(
        &self,
        code: &PairingCode,
        now: DateTime<Utc>,
    ) -> Result<Option<PairingSession>, PairingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = pairing_sessions::table
            .filter(
                pairing_sessions::code
                    .eq(code.as_str())
                    .and(pairing_sessions::status.eq(PENDING))
                    .and(pairing_sessions::expires_at.gt(now)),
            )
            .select(PairingSessionRow::as_select())
            .first::<PairingSessionRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_session).transpose()
    }

    async fn insert(&self, session: &PairingSession) -> Result<(), PairingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let created_at = session.created_at();
        let new_row = NewPairingSessionRow {
            id: session.id().as_str(),
            user_id: *session.user_id().as_uuid(),
            code: session.code().as_str(),
            status: PENDING,
            expires_at: session.expires_at(),
            created_at,
        };

        conn.transaction(|conn| {
            async move {
                // Lapsed rows still marked pending would trip the partial index.
                diesel::update(
                    pairing_sessions::table.filter(
                        pairing_sessions::code
                            .eq(new_row.code)
                            .and(pairing_sessions::status.eq(PENDING))
                            .and(pairing_sessions::expires_at.le(created_at)),
                    ),
                )
                .set(pairing_sessions::status.eq(EXPIRED))
                .execute(conn)
                .await?;

                diesel::insert_into(pairing_sessions::table)
                    .values(&new_row)
                    .execute(conn)
                    .await?;
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_insert_error)
    }

    async fn find_for_owner(
        &self,
        session_id: &PairingSessionId,
        owner: &UserId,
    ) -> Result<Option<PairingSession>, PairingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = pairing_sessions::table
            .filter(
                pairing_sessions::id
                    .eq(session_id.as_str())
                    .and(pairing_sessions::user_id.eq(owner.as_uuid())),
            )
            .select(PairingSessionRow::as_select())
            .first::<PairingSessionRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_session).transpose()
    }

    async fn mark_expired(
        &self,
        session_id: &PairingSessionId,
    ) -> Result<bool, PairingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let updated = diesel::update(
            pairing_sessions::table.filter(
                pairing_sessions::id
                    .eq(session_id.as_str())
                    .and(pairing_sessions::status.eq(PENDING)),
            ),
        )
        .set(pairing_sessions::status.eq(EXPIRED))
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        Ok(updated > 0)
    }

    async fn claim(&self, claim: &PairingClaim) -> Result<(), PairingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let device = &claim.device;
        let device_row = NewDeviceRow {
            device_id: device.device_id().as_str(),
            user_id: *device.user_id().as_uuid(),
            device_name: device.device_name(),
            device_type: device.device_type(),
            firmware_version: device.firmware_version(),
            hardware_version: device.hardware_version(),
            mac_address: device.mac_address(),
            token_digest: claim.token_digest.as_str(),
            is_active: device.is_active(),
            paired_at: claim.paired_at,
        };
        let session_id = claim.session_id.as_str();
        let paired_at = claim.paired_at;

        conn.transaction(|conn| {
            async move {
                let updated = diesel::update(
                    pairing_sessions::table.filter(
                        pairing_sessions::id
                            .eq(session_id)
                            .and(pairing_sessions::status.eq(PENDING))
                            .and(pairing_sessions::expires_at.gt(paired_at)),
                    ),
                )
                .set((
                    pairing_sessions::status.eq(PAIRED),
                    pairing_sessions::device_id.eq(Some(device_row.device_id)),
                    pairing_sessions::paired_at.eq(Some(paired_at)),
                ))
                .execute(conn)
                .await?;
                if updated == 0 {
                    return Err(ClaimError::SessionUnavailable);
                }

                diesel::insert_into(devices::table)
                    .values(&device_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_claim_error)
    }
}
