//! Pairing coordinator.
//!
//! Implements the pairing driving ports: issuing codes, claiming them on
//! behalf of a device, and reporting status to the polling owner.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    DeviceRepository, DeviceRepositoryError, DeviceSummary, PairingClaim, PairingCommand,
    PairingQuery, PairingRepository, PairingRepositoryError, PairingStatusRequest,
    PairingStatusResponse, RandomSource, RandomSourceError, RequestPairingCodeRequest,
    RequestPairingCodeResponse, VerifyPairingCodeRequest, VerifyPairingCodeResponse,
};
use crate::domain::{
    Device, DeviceConfig, DeviceToken, Error, PairingCode, PairingSession, PairingSessionId,
    PairingStatus,
};

/// Upper bound on code draws per request before giving up.
pub const MAX_CODE_ATTEMPTS: usize = 10;

const INVALID_CODE_MESSAGE: &str = "invalid or expired pairing code";
const SESSION_NOT_FOUND_MESSAGE: &str = "pairing session not found";

fn invalid_code() -> Error {
    Error::invalid_pairing_code(INVALID_CODE_MESSAGE)
}

fn session_not_found() -> Error {
    Error::not_found(SESSION_NOT_FOUND_MESSAGE)
}

fn device_already_registered() -> Error {
    Error::device_already_registered("device already registered")
}

fn map_pairing_error(error: PairingRepositoryError) -> Error {
    match error {
        PairingRepositoryError::Connection { message } => {
            Error::internal(format!("pairing repository unavailable: {message}"))
        }
        other => Error::internal(format!("pairing repository error: {other}")),
    }
}

fn map_device_error(error: DeviceRepositoryError) -> Error {
    match error {
        DeviceRepositoryError::Connection { message } => {
            Error::internal(format!("device repository unavailable: {message}"))
        }
        DeviceRepositoryError::Query { message } => {
            Error::internal(format!("device repository error: {message}"))
        }
    }
}

fn map_random_error(error: RandomSourceError) -> Error {
    Error::internal(error.to_string())
}

/// Pairing service implementing [`PairingCommand`] and [`PairingQuery`].
#[derive(Clone)]
pub struct PairingService<P, D> {
    sessions: Arc<P>,
    devices: Arc<D>,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
}

impl<P, D> PairingService<P, D> {
    /// Create a pairing service over the given stores, entropy and time.
    pub fn new(
        sessions: Arc<P>,
        devices: Arc<D>,
        random: Arc<dyn RandomSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            devices,
            random,
            clock,
        }
    }
}

impl<P, D> PairingService<P, D>
where
    P: PairingRepository,
    D: DeviceRepository,
{
    async fn describe(&self, session: &PairingSession) -> Result<PairingStatusResponse, Error> {
        let now = self.clock.utc();
        match session.status() {
            PairingStatus::Pending if session.is_claimable(now) => {
                Ok(PairingStatusResponse::pending(session.remaining_seconds(now)))
            }
            PairingStatus::Pending | PairingStatus::Expired => Ok(PairingStatusResponse::expired()),
            PairingStatus::Paired => {
                let device_id = session.device_id().ok_or_else(|| {
                    Error::internal(format!("paired session {} has no device", session.id()))
                })?;
                let device = self
                    .devices
                    .find_by_id(device_id)
                    .await
                    .map_err(map_device_error)?
                    .ok_or_else(|| {
                        Error::internal(format!(
                            "paired session {} references missing device {device_id}",
                            session.id()
                        ))
                    })?;
                Ok(PairingStatusResponse::paired(DeviceSummary::from(&device)))
            }
        }
    }
}

#[async_trait]
impl<P, D> PairingCommand for PairingService<P, D>
where
    P: PairingRepository,
    D: DeviceRepository,
{
    async fn request_code(
        &self,
        request: RequestPairingCodeRequest,
    ) -> Result<RequestPairingCodeResponse, Error> {
        let now = self.clock.utc();
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = PairingCode::generate(self.random.as_ref()).map_err(map_random_error)?;
            let held = self
                .sessions
                .find_claimable_by_code(&code, now)
                .await
                .map_err(map_pairing_error)?;
            if held.is_some() {
                debug!(attempt, "pairing code held by a pending session; redrawing");
                continue;
            }

            let session =
                PairingSession::issue(PairingSessionId::generate(), request.user_id, code, now);
            match self.sessions.insert(&session).await {
                Ok(()) => {}
                Err(PairingRepositoryError::CodeCollision) => {
                    debug!(attempt, "pairing code claimed concurrently; redrawing");
                    continue;
                }
                Err(error) => return Err(map_pairing_error(error)),
            }

            info!(
                session_id = %session.id(),
                user_id = %session.user_id(),
                "pairing session issued"
            );
            return Ok(RequestPairingCodeResponse {
                code: session.code().as_str().to_owned(),
                session_id: session.id().as_str().to_owned(),
                expires_at: session.expires_at(),
                expires_in_seconds: session.remaining_seconds(now),
            });
        }
        Err(Error::internal(format!(
            "no unique pairing code after {MAX_CODE_ATTEMPTS} attempts"
        )))
    }

    async fn verify_code(
        &self,
        request: VerifyPairingCodeRequest,
    ) -> Result<VerifyPairingCodeResponse, Error> {
        let VerifyPairingCodeRequest { code, registration } = request;
        let code = PairingCode::parse(&code).map_err(|_| invalid_code())?;
        let now = self.clock.utc();

        let session = self
            .sessions
            .find_claimable_by_code(&code, now)
            .await
            .map_err(map_pairing_error)?
            .ok_or_else(invalid_code)?;

        let device_id = registration.device_id().clone();
        if self
            .devices
            .exists(&device_id)
            .await
            .map_err(map_device_error)?
        {
            return Err(device_already_registered());
        }

        let token = DeviceToken::generate(self.random.as_ref()).map_err(map_random_error)?;
        let owner = *session.user_id();
        let claimed = session
            .claim(device_id, now)
            .map_err(|_| invalid_code())?;
        let claim = PairingClaim {
            session_id: claimed.id().clone(),
            device: Device::register(registration, owner, now),
            token_digest: token.digest(),
            paired_at: now,
        };

        match self.sessions.claim(&claim).await {
            Ok(()) => {}
            Err(PairingRepositoryError::SessionUnavailable) => return Err(invalid_code()),
            Err(PairingRepositoryError::DeviceConflict) => {
                return Err(device_already_registered());
            }
            Err(error) => return Err(map_pairing_error(error)),
        }

        info!(
            session_id = %claim.session_id,
            device_id = %claim.device.device_id(),
            user_id = %owner,
            "device paired"
        );
        Ok(VerifyPairingCodeResponse {
            device_token: token.expose().to_owned(),
            user_id: owner,
            config: DeviceConfig::default(),
        })
    }
}

#[async_trait]
impl<P, D> PairingQuery for PairingService<P, D>
where
    P: PairingRepository,
    D: DeviceRepository,
{
    async fn status(&self, request: PairingStatusRequest) -> Result<PairingStatusResponse, Error> {
        let session_id =
            PairingSessionId::new(request.session_id).map_err(|_| session_not_found())?;
        let session = self
            .sessions
            .find_for_owner(&session_id, &request.user_id)
            .await
            .map_err(map_pairing_error)?
            .ok_or_else(session_not_found)?;

        let now = self.clock.utc();
        if !session.is_lapsed(now) {
            return self.describe(&session).await;
        }

        let expired = session
            .expire(now)
            .map_err(|err| Error::internal(format!("pairing session expiry failed: {err}")))?;
        if self
            .sessions
            .mark_expired(expired.id())
            .await
            .map_err(map_pairing_error)?
        {
            info!(session_id = %expired.id(), "pairing session expired");
            return Ok(PairingStatusResponse::expired());
        }

        // Another request changed the row first; report what it wrote.
        let current = self
            .sessions
            .find_for_owner(&session_id, &request.user_id)
            .await
            .map_err(map_pairing_error)?
            .ok_or_else(session_not_found)?;
        self.describe(&current).await
    }
}

#[cfg(test)]
#[path = "pairing_service_tests.rs"]
mod tests;
