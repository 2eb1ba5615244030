//! Device management and bearer-token authentication.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::ports::{
    AuthenticatedDeviceIdentity, DeviceCommand, DeviceQuery, DeviceRepository,
    DeviceRepositoryError, DeviceStatusUpdated, DeviceSummary, ListDevicesResponse,
    RemoveDeviceRequest, UpdateDeviceStatusRequest,
};
use crate::domain::{DeviceId, Error, TokenDigest, UserId};

fn map_repository_error(error: DeviceRepositoryError) -> Error {
    match error {
        DeviceRepositoryError::Connection { message } => {
            Error::internal(format!("device repository unavailable: {message}"))
        }
        DeviceRepositoryError::Query { message } => {
            Error::internal(format!("device repository error: {message}"))
        }
    }
}

/// Device service implementing [`DeviceCommand`] and [`DeviceQuery`].
#[derive(Clone)]
pub struct DeviceService<D> {
    devices: Arc<D>,
    clock: Arc<dyn Clock>,
}

impl<D> DeviceService<D> {
    /// Create a device service over the device repository.
    pub fn new(devices: Arc<D>, clock: Arc<dyn Clock>) -> Self {
        Self { devices, clock }
    }
}

#[async_trait]
impl<D> DeviceCommand for DeviceService<D>
where
    D: DeviceRepository,
{
    async fn remove_device(&self, request: RemoveDeviceRequest) -> Result<(), Error> {
        let not_found = || Error::not_found("device not found");
        let device_id = DeviceId::new(request.device_id).map_err(|_| not_found())?;
        let removed = self
            .devices
            .deactivate(&device_id, &request.user_id)
            .await
            .map_err(map_repository_error)?;
        if !removed {
            return Err(not_found());
        }
        info!(device_id = %device_id, user_id = %request.user_id, "device removed");
        Ok(())
    }

    async fn update_status(
        &self,
        request: UpdateDeviceStatusRequest,
    ) -> Result<DeviceStatusUpdated, Error> {
        let UpdateDeviceStatusRequest {
            device,
            device_id,
            report,
        } = request;
        if device.device_id != device_id {
            return Err(Error::forbidden(
                "authenticated device does not match deviceId",
            ));
        }
        let id = DeviceId::new(device_id)
            .map_err(|_| Error::unauthorized("invalid or inactive device token"))?;
        let updated_at = self.clock.utc();
        let changed = self
            .devices
            .record_status(&id, &report, updated_at)
            .await
            .map_err(map_repository_error)?;
        if !changed {
            return Err(Error::unauthorized("invalid or inactive device token"));
        }
        debug!(
            device_id = %id,
            battery_level = report.battery_level(),
            firmware_version = report.firmware_version(),
            "device status recorded"
        );
        Ok(DeviceStatusUpdated {
            device_id: id.as_str().to_owned(),
            updated_at,
        })
    }
}

#[async_trait]
impl<D> DeviceQuery for DeviceService<D>
where
    D: DeviceRepository,
{
    async fn list_devices(&self, user_id: UserId) -> Result<ListDevicesResponse, Error> {
        let devices = self
            .devices
            .list_active_for_owner(&user_id)
            .await
            .map_err(map_repository_error)?;
        Ok(ListDevicesResponse {
            devices: devices.iter().map(DeviceSummary::from).collect(),
        })
    }

    async fn authenticate(&self, token: String) -> Result<AuthenticatedDeviceIdentity, Error> {
        if token.trim().is_empty() {
            return Err(Error::unauthorized("device token required"));
        }
        let device = self
            .devices
            .find_active_by_token_digest(&TokenDigest::of(&token))
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("invalid or inactive device token"))?;
        Ok(AuthenticatedDeviceIdentity {
            device_id: device.device_id().as_str().to_owned(),
            user_id: *device.user_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::ports::MockDeviceRepository;
    use crate::domain::{
        Device, DeviceRegistration, DeviceRegistrationDraft, DeviceStatusReport, ErrorCode,
    };
    use crate::test_support::MutableClock;

    fn service_over(repo: MockDeviceRepository) -> DeviceService<MockDeviceRepository> {
        DeviceService::new(
            Arc::new(repo),
            Arc::new(MutableClock::new(Utc::now())) as Arc<dyn Clock>,
        )
    }

    fn device(owner: UserId) -> Device {
        let registration = DeviceRegistration::new(DeviceRegistrationDraft {
            device_id: "glasses-001".to_owned(),
            device_type: "smart_glasses".to_owned(),
            ..DeviceRegistrationDraft::default()
        })
        .expect("valid registration");
        Device::register(registration, owner, Utc::now())
    }

    #[rstest]
    #[tokio::test]
    async fn list_devices_returns_summaries() {
        let owner = UserId::random();
        let mut repo = MockDeviceRepository::new();
        repo.expect_list_active_for_owner()
            .times(1)
            .return_once(move |_| Ok(vec![device(owner)]));

        let service = service_over(repo);
        let response = service.list_devices(owner).await.expect("list succeeds");

        assert_eq!(response.devices.len(), 1);
        assert_eq!(response.devices[0].device_id, "glasses-001");
        assert!(response.devices[0].is_active);
    }

    #[rstest]
    #[case(true, None)]
    #[case(false, Some(ErrorCode::NotFound))]
    #[tokio::test]
    async fn remove_device_requires_an_active_owned_device(
        #[case] changed: bool,
        #[case] expected: Option<ErrorCode>,
    ) {
        let mut repo = MockDeviceRepository::new();
        repo.expect_deactivate()
            .times(1)
            .return_once(move |_, _| Ok(changed));

        let service = service_over(repo);
        let result = service
            .remove_device(RemoveDeviceRequest {
                user_id: UserId::random(),
                device_id: "glasses-001".to_owned(),
            })
            .await;

        assert_eq!(result.err().map(|err| err.code()), expected);
    }

    #[rstest]
    #[tokio::test]
    async fn remove_device_hides_malformed_ids() {
        let mut repo = MockDeviceRepository::new();
        repo.expect_deactivate().times(0);

        let service = service_over(repo);
        let error = service
            .remove_device(RemoveDeviceRequest {
                user_id: UserId::random(),
                device_id: "x".repeat(80),
            })
            .await
            .expect_err("not found");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn authenticate_looks_up_token_digest() {
        let owner = UserId::random();
        let mut repo = MockDeviceRepository::new();
        repo.expect_find_active_by_token_digest()
            .withf(|digest| *digest == TokenDigest::of("secret-token"))
            .times(1)
            .return_once(move |_| Ok(Some(device(owner))));

        let service = service_over(repo);
        let identity = service
            .authenticate("secret-token".to_owned())
            .await
            .expect("token accepted");

        assert_eq!(identity.user_id, owner);
        assert_eq!(identity.device_id, "glasses-001");
    }

    #[rstest]
    #[case("", "device token required")]
    #[case("unknown", "invalid or inactive device token")]
    #[tokio::test]
    async fn authenticate_rejects_missing_and_unknown_tokens(
        #[case] token: &str,
        #[case] message: &str,
    ) {
        let mut repo = MockDeviceRepository::new();
        repo.expect_find_active_by_token_digest()
            .returning(|_| Ok(None));

        let service = service_over(repo);
        let error = service
            .authenticate(token.to_owned())
            .await
            .expect_err("rejected");

        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.message(), message);
    }

    fn status_request(authenticated: &str, claimed: &str) -> UpdateDeviceStatusRequest {
        UpdateDeviceStatusRequest {
            device: AuthenticatedDeviceIdentity {
                device_id: authenticated.to_owned(),
                user_id: UserId::random(),
            },
            device_id: claimed.to_owned(),
            report: DeviceStatusReport::new(Some(64), Some("1.2.0".to_owned()))
                .expect("valid report"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn update_status_stamps_the_clock_time() {
        let now = Utc::now();
        let mut repo = MockDeviceRepository::new();
        repo.expect_record_status()
            .withf(move |id, report, at| {
                id.as_str() == "glasses-001" && report.battery_level() == Some(64) && *at == now
            })
            .times(1)
            .return_once(|_, _, _| Ok(true));

        let service = DeviceService::new(
            Arc::new(repo),
            Arc::new(MutableClock::new(now)) as Arc<dyn Clock>,
        );
        let updated = service
            .update_status(status_request("glasses-001", "glasses-001"))
            .await
            .expect("status recorded");

        assert_eq!(updated.device_id, "glasses-001");
        assert_eq!(updated.updated_at, now);
    }

    #[rstest]
    #[tokio::test]
    async fn update_status_rejects_another_devices_id() {
        let mut repo = MockDeviceRepository::new();
        repo.expect_record_status().times(0);

        let error = service_over(repo)
            .update_status(status_request("glasses-001", "glasses-002"))
            .await
            .expect_err("mismatch");

        assert_eq!(error.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn update_status_rejects_devices_removed_meanwhile() {
        let mut repo = MockDeviceRepository::new();
        repo.expect_record_status()
            .times(1)
            .return_once(|_, _, _| Ok(false));

        let error = service_over(repo)
            .update_status(status_request("glasses-001", "glasses-001"))
            .await
            .expect_err("inactive");

        assert_eq!(error.code(), ErrorCode::Unauthorized);
    }
}
