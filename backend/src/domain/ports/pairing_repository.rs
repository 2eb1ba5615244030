//! Port for pairing session persistence and the atomic claim.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Device, PairingCode, PairingSession, PairingSessionId, TokenDigest, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by pairing repository adapters.
    pub enum PairingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "pairing repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "pairing repository query failed: {message}",
        /// Another pending session already holds the code.
        CodeCollision => "pairing code already held by a pending session",
        /// The session was no longer pending and unexpired at claim time.
        SessionUnavailable => "pairing session is no longer claimable",
        /// A device with the same identifier already exists.
        DeviceConflict => "device already registered",
    }
}

/// Everything written by a successful claim.
#[derive(Debug, Clone)]
pub struct PairingClaim {
    /// Session being claimed.
    pub session_id: PairingSessionId,
    /// Device created by the claim.
    pub device: Device,
    /// Digest of the bearer token handed to the device.
    pub token_digest: TokenDigest,
    /// Claim time; also the claimability cut-off.
    pub paired_at: DateTime<Utc>,
}

/// Port for reading and writing pairing sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PairingRepository: Send + Sync {
    /// Find the pending session holding `code` whose deadline is after `now`.
    async fn find_claimable_by_code(
        &self,
        code: &PairingCode,
        now: DateTime<Utc>,
    ) -> Result<Option<PairingSession>, PairingRepositoryError>;

    /// Persist a freshly issued session.
    ///
    /// Pending sessions holding the same code whose deadline is at or before
    /// the new session's creation time are retired to `expired` first.
    /// Returns [`PairingRepositoryError::CodeCollision`] when a live pending
    /// session still holds the code.
    async fn insert(&self, session: &PairingSession) -> Result<(), PairingRepositoryError>;

    /// Find a session by id, restricted to its owner.
    async fn find_for_owner(
        &self,
        session_id: &PairingSessionId,
        owner: &UserId,
    ) -> Result<Option<PairingSession>, PairingRepositoryError>;

    /// Mark a session `expired` if it is still `pending`.
    ///
    /// Returns whether a row changed; concurrent callers observe one `true`.
    async fn mark_expired(
        &self,
        session_id: &PairingSessionId,
    ) -> Result<bool, PairingRepositoryError>;

    /// Atomically mark the session `paired` and create the device.
    ///
    /// Either both writes happen or neither does.
    async fn claim(&self, claim: &PairingClaim) -> Result<(), PairingRepositoryError>;
}
