//! Device management HTTP handlers.
//!
//! ```text
//! GET    /api/v1/mobile/devices
//! DELETE /api/v1/mobile/devices/{device_id}
//! GET    /api/v1/iot/devices/config
//! POST   /api/v1/iot/devices/status
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::ports::{RemoveDeviceRequest, UpdateDeviceStatusRequest};
use crate::domain::{DeviceConfig, DeviceStatusReport};
use crate::inbound::http::ApiResult;
use crate::inbound::http::device_auth::AuthenticatedDevice;
use crate::inbound::http::envelope::ApiResponse;
use crate::inbound::http::pairing::validation_error;
use crate::inbound::http::schemas::{
    DeviceConfigSchema, DeviceListSchema, ErrorEnvelopeSchema, SuccessEnvelopeSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

pub(crate) const DEVICES_RETRIEVED: &str = "Devices retrieved successfully";
pub(crate) const DEVICE_REMOVED: &str = "Device removed successfully";
pub(crate) const CONFIG_RETRIEVED: &str = "Device configuration retrieved successfully";
pub(crate) const STATUS_UPDATED: &str = "Device status updated successfully";

/// Confirmation returned after a device is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRemovedBody {
    /// Identifier of the deactivated device.
    pub device_id: String,
    /// Always `removed`.
    #[schema(example = "removed")]
    pub status: String,
}

/// Upload configuration for the calling device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfigBody {
    /// Identifier of the device holding the bearer token.
    pub device_id: String,
    #[schema(value_type = DeviceConfigSchema)]
    pub config: DeviceConfig,
}

/// Periodic status report sent by a paired device.
///
/// Unknown fields such as `storageAvailableMb` are accepted and ignored.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusBody {
    /// Must match the device holding the bearer token.
    #[schema(example = "GLS-00042")]
    pub device_id: String,
    /// Battery charge in percent, 0 to 100.
    #[serde(default)]
    #[schema(example = 87, maximum = 100)]
    pub battery_level: Option<u8>,
    /// Installed firmware, at most 20 characters.
    #[serde(default)]
    #[schema(example = "1.0.4")]
    pub firmware_version: Option<String>,
}

/// Acknowledgement of a status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusUpdatedBody {
    /// Identifier of the reporting device.
    pub device_id: String,
    /// Time the report was recorded.
    pub updated_at: DateTime<Utc>,
    /// Always `updated`.
    #[schema(example = "updated")]
    pub status: String,
}

/// List the signed-in user's active devices.
#[utoipa::path(
    get,
    path = "/api/v1/mobile/devices",
    responses(
        (status = 200, description = "Active devices", body = SuccessEnvelopeSchema<DeviceListSchema>),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema)
    ),
    tags = ["devices"],
    operation_id = "listDevices",
    security(("SessionCookie" = []))
)]
#[get("/devices")]
pub async fn list_devices(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let response = state.devices_query.list_devices(user_id).await?;
    Ok(ApiResponse::success(DEVICES_RETRIEVED, response).ok())
}

/// Deactivate one of the signed-in user's devices, revoking its token.
#[utoipa::path(
    delete,
    path = "/api/v1/mobile/devices/{device_id}",
    params(("device_id" = String, Path, description = "Device identifier")),
    responses(
        (status = 200, description = "Device removed", body = SuccessEnvelopeSchema<DeviceRemovedBody>),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 404, description = "Unknown or already removed device", body = ErrorEnvelopeSchema)
    ),
    tags = ["devices"],
    operation_id = "removeDevice",
    security(("SessionCookie" = []))
)]
#[delete("/devices/{device_id}")]
pub async fn remove_device(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let device_id = path.into_inner();
    state
        .devices
        .remove_device(RemoveDeviceRequest {
            user_id,
            device_id: device_id.clone(),
        })
        .await?;
    Ok(ApiResponse::success(
        DEVICE_REMOVED,
        DeviceRemovedBody {
            device_id,
            status: "removed".to_owned(),
        },
    )
    .ok())
}

/// Upload configuration for the device holding the bearer token.
#[utoipa::path(
    get,
    path = "/api/v1/iot/devices/config",
    responses(
        (status = 200, description = "Device configuration", body = SuccessEnvelopeSchema<DeviceConfigBody>),
        (status = 401, description = "Missing or invalid device token", body = ErrorEnvelopeSchema)
    ),
    tags = ["devices"],
    operation_id = "getDeviceConfig",
    security(("DeviceBearer" = []))
)]
#[get("/devices/config")]
pub async fn device_config(device: AuthenticatedDevice) -> ApiResult<HttpResponse> {
    let AuthenticatedDevice(identity) = device;
    debug!(device_id = %identity.device_id, "device configuration requested");
    Ok(ApiResponse::success(
        CONFIG_RETRIEVED,
        DeviceConfigBody {
            device_id: identity.device_id,
            config: DeviceConfig::default(),
        },
    )
    .ok())
}

/// Record battery and firmware details for the device holding the bearer
/// token.
#[utoipa::path(
    post,
    path = "/api/v1/iot/devices/status",
    request_body = DeviceStatusBody,
    responses(
        (status = 200, description = "Status recorded", body = SuccessEnvelopeSchema<DeviceStatusUpdatedBody>),
        (status = 400, description = "Invalid status report", body = ErrorEnvelopeSchema),
        (status = 401, description = "Missing or invalid device token", body = ErrorEnvelopeSchema),
        (status = 403, description = "deviceId belongs to another device", body = ErrorEnvelopeSchema)
    ),
    tags = ["devices"],
    operation_id = "updateDeviceStatus",
    security(("DeviceBearer" = []))
)]
#[post("/devices/status")]
pub async fn update_device_status(
    state: web::Data<HttpState>,
    device: AuthenticatedDevice,
    payload: web::Json<DeviceStatusBody>,
) -> ApiResult<HttpResponse> {
    let AuthenticatedDevice(identity) = device;
    let DeviceStatusBody {
        device_id,
        battery_level,
        firmware_version,
    } = payload.into_inner();
    let report =
        DeviceStatusReport::new(battery_level, firmware_version).map_err(validation_error)?;
    let updated = state
        .devices
        .update_status(UpdateDeviceStatusRequest {
            device: identity,
            device_id,
            report,
        })
        .await?;
    Ok(ApiResponse::success(
        STATUS_UPDATED,
        DeviceStatusUpdatedBody {
            device_id: updated.device_id,
            updated_at: updated.updated_at,
            status: "updated".to_owned(),
        },
    )
    .ok())
}

#[cfg(test)]
#[path = "devices_tests.rs"]
mod tests;
