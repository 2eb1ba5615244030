//! Domain primitives, aggregates, and services.
//!
//! Purpose: define strongly typed entities for device pairing and admission
//! control, plus the services implementing the driving ports. Nothing here
//! depends on actix or Diesel.
//!
//! Public surface:
//! - Error (alias to `error::Error`) — transport-agnostic error payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - PairingSession / PairingCode — pairing lifecycle and its secret.
//! - Device / DeviceToken — durable device credential.
//! - admission — token-bucket admission control.

pub mod admission;
pub mod device;
pub mod device_service;
pub mod error;
pub mod pairing;
pub mod pairing_service;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::device::{
    Device, DeviceConfig, DeviceDraft, DeviceId, DeviceRegistration, DeviceRegistrationDraft,
    DeviceStatusReport, DeviceToken, DeviceValidationError, TokenDigest,
};
pub use self::device_service::DeviceService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::pairing::{
    PAIRING_CODE_LEN, PAIRING_TTL_SECONDS, PairingCode, PairingCodeError, PairingSession,
    PairingSessionDraft, PairingSessionId, PairingSessionIdError, PairingStatus,
    PairingTransitionError,
};
pub use self::pairing_service::{MAX_CODE_ATTEMPTS, PairingService};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{UserId, UserIdError};
