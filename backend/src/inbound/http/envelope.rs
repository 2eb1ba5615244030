//! JSON response envelope shared by every endpoint.
//!
//! Success bodies look like `{"status":"success","message":..,"data":..}`;
//! failures look like `{"status":"error","message":..,"error":{..}}` where
//! `error` is the serialised domain [`Error`].

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::Error;

/// Outcome marker carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeStatus {
    /// The request succeeded.
    Success,
    /// The request failed; see the `error` member.
    Error,
}

/// Success envelope wrapping a response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Always [`EnvelopeStatus::Success`].
    pub status: EnvelopeStatus,
    /// Short human-readable summary.
    pub message: String,
    /// Endpoint payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data` in a success envelope.
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: EnvelopeStatus::Success,
            message: message.into(),
            data,
        }
    }

    /// Render with `200 OK`.
    pub fn ok(self) -> HttpResponse {
        self.respond(StatusCode::OK)
    }

    /// Render with an explicit status.
    pub fn respond(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

/// Failure envelope produced by the [`Error`] response mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always [`EnvelopeStatus::Error`].
    pub status: EnvelopeStatus,
    /// Copy of `error.message` for clients that only read the top level.
    pub message: String,
    /// Structured error payload.
    pub error: Error,
}

impl From<Error> for ErrorResponse {
    fn from(error: Error) -> Self {
        Self {
            status: EnvelopeStatus::Error,
            message: error.message().to_owned(),
            error,
        }
    }
}
