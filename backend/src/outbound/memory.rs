//! Process-local pairing and device store.
//!
//! Used when no database is configured and by tests. A single mutex guards
//! sessions and devices together, so a claim's session update and device
//! insert are observed atomically. Sessions are dropped one TTL after their
//! deadline, the next time a code is issued.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    DeviceRepository, DeviceRepositoryError, PairingClaim, PairingRepository,
    PairingRepositoryError,
};
use crate::domain::pairing::pairing_ttl;
use crate::domain::{
    Device, DeviceId, DeviceStatusReport, PairingCode, PairingSession, PairingSessionId,
    PairingStatus, TokenDigest, UserId,
};

#[derive(Debug, Clone)]
struct StoredDevice {
    device: Device,
    token_digest: TokenDigest,
}

#[derive(Debug, Default)]
struct MemoryState {
    sessions: HashMap<PairingSessionId, PairingSession>,
    devices: HashMap<DeviceId, StoredDevice>,
}

/// In-memory implementation of [`PairingRepository`] and [`DeviceRepository`].
#[derive(Debug, Default)]
pub struct InMemoryPairingStore {
    state: Mutex<MemoryState>,
}

impl InMemoryPairingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, String> {
        self.state
            .lock()
            .map_err(|_| "in-memory pairing store lock poisoned".to_owned())
    }

    fn lock_sessions(&self) -> Result<MutexGuard<'_, MemoryState>, PairingRepositoryError> {
        self.lock().map_err(PairingRepositoryError::query)
    }

    fn lock_devices(&self) -> Result<MutexGuard<'_, MemoryState>, DeviceRepositoryError> {
        self.lock().map_err(DeviceRepositoryError::query)
    }
}

fn retire(session: &mut PairingSession, at: DateTime<Utc>) {
    if let Ok(expired) = session.clone().expire(at) {
        *session = expired;
    }
}

#[async_trait]
impl PairingRepository for InMemoryPairingStore {
    async fn find_claimable_by_code(
        &self,
        code: &PairingCode,
        now: DateTime<Utc>,
    ) -> Result<Option<PairingSession>, PairingRepositoryError> {
        let state = self.lock_sessions()?;
        Ok(state
            .sessions
            .values()
            .find(|session| session.code() == code && session.is_claimable(now))
            .cloned())
    }

    async fn insert(&self, session: &PairingSession) -> Result<(), PairingRepositoryError> {
        let mut state = self.lock_sessions()?;
        let created_at = session.created_at();
        let held_live = state
            .sessions
            .values()
            .any(|held| held.code() == session.code() && held.is_claimable(created_at));
        if held_live {
            return Err(PairingRepositoryError::code_collision());
        }
        state
            .sessions
            .retain(|_, held| held.expires_at() + pairing_ttl() > created_at);
        for held in state.sessions.values_mut() {
            if held.code() == session.code() && held.is_lapsed(created_at) {
                retire(held, created_at);
            }
        }
        state.sessions.insert(session.id().clone(), session.clone());
        Ok(())
    }

    async fn find_for_owner(
        &self,
        session_id: &PairingSessionId,
        owner: &UserId,
    ) -> Result<Option<PairingSession>, PairingRepositoryError> {
        let state = self.lock_sessions()?;
        Ok(state
            .sessions
            .get(session_id)
            .filter(|session| session.user_id() == owner)
            .cloned())
    }

    async fn mark_expired(
        &self,
        session_id: &PairingSessionId,
    ) -> Result<bool, PairingRepositoryError> {
        let mut state = self.lock_sessions()?;
        let Some(session) = state.sessions.get_mut(session_id) else {
            return Ok(false);
        };
        if session.status() != PairingStatus::Pending {
            return Ok(false);
        }
        let deadline = session.expires_at();
        retire(session, deadline);
        Ok(true)
    }

    async fn claim(&self, claim: &PairingClaim) -> Result<(), PairingRepositoryError> {
        let mut state = self.lock_sessions()?;
        let device_id = claim.device.device_id();
        let Some(session) = state.sessions.get(&claim.session_id) else {
            return Err(PairingRepositoryError::session_unavailable());
        };
        if !session.is_claimable(claim.paired_at) {
            return Err(PairingRepositoryError::session_unavailable());
        }
        let claimed = session
            .clone()
            .claim(device_id.clone(), claim.paired_at)
            .map_err(|_| PairingRepositoryError::session_unavailable())?;
        let token_taken = state
            .devices
            .values()
            .any(|stored| stored.token_digest == claim.token_digest);
        if state.devices.contains_key(device_id) || token_taken {
            return Err(PairingRepositoryError::device_conflict());
        }

        state.sessions.insert(claim.session_id.clone(), claimed);
        state.devices.insert(
            device_id.clone(),
            StoredDevice {
                device: claim.device.clone(),
                token_digest: claim.token_digest.clone(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl DeviceRepository for InMemoryPairingStore {
    async fn exists(&self, device_id: &DeviceId) -> Result<bool, DeviceRepositoryError> {
        Ok(self.lock_devices()?.devices.contains_key(device_id))
    }

    async fn find_by_id(
        &self,
        device_id: &DeviceId,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        Ok(self
            .lock_devices()?
            .devices
            .get(device_id)
            .map(|stored| stored.device.clone()))
    }

    async fn find_active_by_token_digest(
        &self,
        digest: &TokenDigest,
    ) -> Result<Option<Device>, DeviceRepositoryError> {
        Ok(self
            .lock_devices()?
            .devices
            .values()
            .find(|stored| stored.device.is_active() && &stored.token_digest == digest)
            .map(|stored| stored.device.clone()))
    }

    async fn list_active_for_owner(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Device>, DeviceRepositoryError> {
        let state = self.lock_devices()?;
        let mut devices: Vec<Device> = state
            .devices
            .values()
            .filter(|stored| stored.device.is_active() && stored.device.user_id() == owner)
            .map(|stored| stored.device.clone())
            .collect();
        devices.sort_by(|a, b| b.paired_at().cmp(&a.paired_at()));
        Ok(devices)
    }

    async fn deactivate(
        &self,
        device_id: &DeviceId,
        owner: &UserId,
    ) -> Result<bool, DeviceRepositoryError> {
        let mut state = self.lock_devices()?;
        match state.devices.get_mut(device_id) {
            Some(stored) if stored.device.is_active() && stored.device.user_id() == owner => {
                stored.device.deactivate();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_status(
        &self,
        device_id: &DeviceId,
        report: &DeviceStatusReport,
        at: DateTime<Utc>,
    ) -> Result<bool, DeviceRepositoryError> {
        let mut state = self.lock_devices()?;
        match state.devices.get_mut(device_id) {
            Some(stored) if stored.device.is_active() => {
                stored.device.record_status(report, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
