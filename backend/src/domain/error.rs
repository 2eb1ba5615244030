//! Domain-level error types.
//!
//! These errors are transport agnostic. The HTTP adapter maps them to status
//! codes and the JSON response envelope; the domain only decides the stable
//! [`ErrorCode`] and a human-readable message.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// Authentication failed or is missing.
    Unauthorized,
    /// The caller is authenticated but may not act on the target.
    Forbidden,
    /// The requested resource does not exist or is not visible to the caller.
    NotFound,
    /// The pairing code is unknown, expired, or already claimed.
    InvalidPairingCode,
    /// The device identifier already holds a credential.
    DeviceAlreadyRegistered,
    /// The lenient, all-traffic admission policy rejected the request.
    RateLimitExceeded,
    /// The strict admission policy guarding sensitive routes rejected the request.
    StrictRateLimitExceeded,
    /// An unexpected error occurred inside the domain or a driven adapter.
    InternalError,
}

impl ErrorCode {
    /// Fallback message used when a caller supplies a blank one.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "authentication required",
            Self::Forbidden => "operation not permitted",
            Self::NotFound => "resource not found",
            Self::InvalidPairingCode => "invalid or expired pairing code",
            Self::DeviceAlreadyRegistered => "device already registered",
            Self::RateLimitExceeded => "too many requests",
            Self::StrictRateLimitExceeded => "too many requests to a sensitive endpoint",
            Self::InternalError => "internal error",
        }
    }

    /// Whether this code reports an admission rejection.
    #[must_use]
    pub const fn is_rate_limit(self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::StrictRateLimitExceeded)
    }
}

/// Domain error payload.
///
/// Construction captures the request-scoped [`TraceId`] when one is in scope,
/// so errors raised anywhere below a traced request correlate automatically.
///
/// ## Invariants
/// - `message` is non-empty once trimmed of whitespace.
/// - `trace_id`, when present, is non-empty.
///
/// # Examples
/// ```
/// use runsight_backend::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("pairing session not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert!(err.trace_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    trace_id: Option<String>,
    details: Option<Value>,
}

/// Validation errors raised when decoding an error payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    /// The message was empty or whitespace.
    #[error("error message must not be empty")]
    EmptyMessage,
    /// The trace identifier was empty or whitespace.
    #[error("trace identifier must not be empty")]
    EmptyTraceId,
}

impl Error {
    /// Create a new error.
    ///
    /// A blank message is replaced by [`ErrorCode::default_message`].
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.default_message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            trace_id: TraceId::current().map(|id| id.to_string()),
            details: None,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Correlation identifier captured at construction, if any.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Supplementary structured details.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Suggested retry delay in whole seconds for admission rejections.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        if !self.code.is_rate_limit() {
            return None;
        }
        self.details
            .as_ref()
            .and_then(|details| details.get("retryAfter"))
            .and_then(Value::as_u64)
    }

    /// Attach a trace identifier, replacing any captured one.
    #[must_use]
    pub fn with_trace_id(mut self, id: impl Into<String>) -> Self {
        self.trace_id = Some(id.into());
        self
    }

    /// Attach structured details to the error.
    ///
    /// # Examples
    /// ```
    /// use runsight_backend::domain::Error;
    /// use serde_json::json;
    ///
    /// let err = Error::invalid_request("bad").with_details(json!({ "field": "deviceId" }));
    /// assert!(err.details().is_some());
    /// ```
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Unauthorized`].
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidPairingCode`].
    pub fn invalid_pairing_code(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidPairingCode, message)
    }

    /// Convenience constructor for [`ErrorCode::DeviceAlreadyRegistered`].
    pub fn device_already_registered(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DeviceAlreadyRegistered, message)
    }

    /// Admission rejection carrying a `retryAfter` hint in whole seconds.
    ///
    /// `code` should be one of the rate-limit codes; other codes still carry
    /// the hint in `details` but [`Error::retry_after_secs`] ignores it.
    pub fn rate_limited(code: ErrorCode, message: impl Into<String>, retry_after: Duration) -> Self {
        Self::new(code, message).with_details(json!({ "retryAfter": retry_after.as_secs() }))
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            trace_id: value.trace_id,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            trace_id,
            details,
        } = value;
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        if trace_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(ErrorValidationError::EmptyTraceId);
        }
        // Payloads carry their own correlation id; never adopt the ambient one.
        Ok(Self {
            code,
            message,
            trace_id,
            details,
        })
    }
}
