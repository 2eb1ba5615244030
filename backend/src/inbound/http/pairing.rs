//! Pairing HTTP handlers.
//!
//! ```text
//! POST /api/v1/mobile/pairing/request
//! GET  /api/v1/mobile/pairing/{session_id}/status
//! POST /api/v1/iot/pairing/verify
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::{
    PairingStatusRequest, RequestPairingCodeRequest, VerifyPairingCodeRequest,
};
use crate::domain::{DeviceRegistration, DeviceRegistrationDraft, DeviceValidationError, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::ApiResponse;
use crate::inbound::http::schemas::{
    ErrorEnvelopeSchema, PairingCodeSchema, PairingStatusSchema, PairingVerifiedSchema,
    SuccessEnvelopeSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

pub(crate) const CODE_ISSUED: &str = "Pairing code generated successfully";
pub(crate) const DEVICE_PAIRED: &str = "Device paired successfully";
pub(crate) const STATUS_RETRIEVED: &str = "Pairing status retrieved successfully";

/// Device registration presented together with a pairing code.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPairingCodeBody {
    /// Six-digit code shown on the mobile app.
    #[schema(example = "482913")]
    pub code: String,
    /// Stable hardware identifier.
    #[schema(example = "GLS-00042")]
    pub device_id: String,
    /// Device family, e.g. `smart_glasses`.
    #[schema(example = "smart_glasses")]
    pub device_type: String,
    /// Installed firmware, at most 20 characters.
    #[serde(default)]
    #[schema(example = "1.0.3")]
    pub firmware_version: Option<String>,
    /// Hardware revision, at most 20 characters.
    #[serde(default)]
    pub hardware_version: Option<String>,
    /// Six colon- or dash-separated hex octets.
    #[serde(default)]
    #[schema(example = "AA:BB:CC:DD:EE:FF")]
    pub mac_address: Option<String>,
}

pub(crate) fn validation_error(error: DeviceValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": error.field() }))
}

fn parse_verify_body(body: VerifyPairingCodeBody) -> Result<VerifyPairingCodeRequest, Error> {
    let registration = DeviceRegistration::new(DeviceRegistrationDraft {
        device_id: body.device_id,
        device_type: body.device_type,
        firmware_version: body.firmware_version,
        hardware_version: body.hardware_version,
        mac_address: body.mac_address,
    })
    .map_err(validation_error)?;
    // The code is left raw: a malformed code must be indistinguishable from
    // an unknown one.
    Ok(VerifyPairingCodeRequest {
        code: body.code,
        registration,
    })
}

/// Issue a pairing code for the signed-in user.
#[utoipa::path(
    post,
    path = "/api/v1/mobile/pairing/request",
    responses(
        (status = 200, description = "Pairing code issued", body = SuccessEnvelopeSchema<PairingCodeSchema>),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 429, description = "Too many requests", body = ErrorEnvelopeSchema),
        (status = 500, description = "Internal server error", body = ErrorEnvelopeSchema)
    ),
    tags = ["pairing"],
    operation_id = "requestPairingCode",
    security(("SessionCookie" = []))
)]
#[post("/request")]
pub async fn request_pairing_code(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let response = state
        .pairing
        .request_code(RequestPairingCodeRequest { user_id })
        .await?;
    Ok(ApiResponse::success(CODE_ISSUED, response).ok())
}

/// Poll a pairing session owned by the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/mobile/pairing/{session_id}/status",
    params(("session_id" = String, Path, description = "Pairing session identifier")),
    responses(
        (status = 200, description = "Pairing status", body = SuccessEnvelopeSchema<PairingStatusSchema>),
        (status = 401, description = "Unauthorized", body = ErrorEnvelopeSchema),
        (status = 404, description = "Unknown session", body = ErrorEnvelopeSchema),
        (status = 429, description = "Too many requests", body = ErrorEnvelopeSchema)
    ),
    tags = ["pairing"],
    operation_id = "getPairingStatus",
    security(("SessionCookie" = []))
)]
#[get("/{session_id}/status")]
pub async fn pairing_status(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let response = state
        .pairing_query
        .status(PairingStatusRequest {
            session_id: path.into_inner(),
            user_id,
        })
        .await?;
    Ok(ApiResponse::success(STATUS_RETRIEVED, response).ok())
}

/// Claim a pairing code from a device and issue its bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/iot/pairing/verify",
    request_body = VerifyPairingCodeBody,
    responses(
        (status = 200, description = "Device paired", body = SuccessEnvelopeSchema<PairingVerifiedSchema>),
        (status = 400, description = "Invalid registration", body = ErrorEnvelopeSchema),
        (status = 401, description = "Invalid or expired pairing code", body = ErrorEnvelopeSchema),
        (status = 409, description = "Device already registered", body = ErrorEnvelopeSchema),
        (status = 429, description = "Too many requests", body = ErrorEnvelopeSchema)
    ),
    tags = ["pairing"],
    operation_id = "verifyPairingCode"
)]
#[post("/verify")]
pub async fn verify_pairing_code(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyPairingCodeBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_verify_body(payload.into_inner())?;
    let response = state.pairing.verify_code(request).await?;
    Ok(ApiResponse::success(DEVICE_PAIRED, response).ok())
}

#[cfg(test)]
#[path = "pairing_tests.rs"]
mod tests;
