//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The schema wrappers mirror the serialised shape of their domain
//! counterparts but live in the inbound adapter layer where framework
//! concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The authenticated caller may not act on the target.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The pairing code is unknown, expired, or already claimed.
    #[schema(rename = "invalid_pairing_code")]
    InvalidPairingCode,
    /// The device identifier already holds a credential.
    #[schema(rename = "device_already_registered")]
    DeviceAlreadyRegistered,
    /// Global admission policy rejected the request.
    #[schema(rename = "rate_limit_exceeded")]
    RateLimitExceeded,
    /// Sensitive-endpoint admission policy rejected the request.
    #[schema(rename = "strict_rate_limit_exceeded")]
    StrictRateLimitExceeded,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_pairing_code")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "invalid or expired pairing code")]
    message: String,
    /// Correlation identifier, also sent as the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary details, e.g. `{"field": "deviceId"}` or
    /// `{"retryAfter": 120}`.
    details: Option<serde_json::Value>,
}

/// Failure envelope.
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorEnvelopeSchema {
    /// Always `error`.
    #[schema(example = "error")]
    status: String,
    /// Copy of `error.message`.
    message: String,
    error: ErrorSchema,
}

/// Success envelope around an endpoint payload.
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct SuccessEnvelopeSchema<T> {
    /// Always `success`.
    #[schema(example = "success")]
    status: String,
    /// Short human-readable summary.
    message: String,
    data: T,
}

/// OpenAPI schema for [`crate::domain::DeviceConfig`].
#[derive(ToSchema)]
#[schema(as = crate::domain::DeviceConfig)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct DeviceConfigSchema {
    #[schema(example = 300)]
    upload_interval_seconds: u32,
    #[schema(example = 10)]
    batch_size: u32,
    #[schema(example = true)]
    compression_enabled: bool,
}

/// OpenAPI schema for [`crate::domain::ports::DeviceSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::DeviceSummary)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct DeviceSummarySchema {
    #[schema(example = "GLS-00042")]
    device_id: String,
    device_name: String,
    #[schema(example = "smart_glasses")]
    device_type: String,
    firmware_version: Option<String>,
    hardware_version: Option<String>,
    mac_address: Option<String>,
    is_active: bool,
    #[schema(format = "date-time")]
    paired_at: String,
    /// Last reported battery level in percent.
    battery_level: Option<u8>,
    /// Time of the last status report.
    #[schema(format = "date-time")]
    last_sync_at: Option<String>,
}

/// OpenAPI schema for [`crate::domain::ports::ListDevicesResponse`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::ListDevicesResponse)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct DeviceListSchema {
    devices: Vec<DeviceSummarySchema>,
}

/// OpenAPI schema for [`crate::domain::ports::RequestPairingCodeResponse`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::RequestPairingCodeResponse)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PairingCodeSchema {
    /// Six-digit code to type into the device.
    #[schema(example = "482913")]
    code: String,
    #[schema(example = "pair_0a1b2c3d4e5f40718293a4b5c6d7e8f9")]
    session_id: String,
    #[schema(format = "date-time")]
    expires_at: String,
    #[schema(example = 300)]
    expires_in_seconds: u64,
}

/// OpenAPI schema for [`crate::domain::ports::VerifyPairingCodeResponse`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::VerifyPairingCodeResponse)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PairingVerifiedSchema {
    /// Bearer token; shown once and stored only as a digest.
    device_token: String,
    #[schema(format = "uuid")]
    user_id: String,
    config: DeviceConfigSchema,
}

/// OpenAPI schema for [`crate::domain::ports::PairingStatusResponse`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::PairingStatusResponse)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PairingStatusSchema {
    paired: bool,
    expired: bool,
    /// Present while the session is pending.
    remaining_seconds: Option<u64>,
    /// Present once the session is paired.
    device: Option<DeviceSummarySchema>,
}
