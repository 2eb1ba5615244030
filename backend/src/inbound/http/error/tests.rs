//! Tests for HTTP error mapping.

use super::*;
use crate::domain::Error;
use crate::inbound::http::envelope::EnvelopeStatus;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;
use std::time::Duration;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("pairing repository unavailable: connection refused")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn invalid_request_case(expected_trace_id: String) -> Error {
    Error::invalid_request("deviceId is required")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"field": "deviceId"}))
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::invalid_pairing_code("invalid"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("mismatch"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::device_already_registered("taken"), StatusCode::CONFLICT)]
#[case(
    Error::rate_limited(ErrorCode::RateLimitExceeded, "slow down", Duration::from_secs(60)),
    StatusCode::TOO_MANY_REQUESTS
)]
#[case(
    Error::rate_limited(ErrorCode::StrictRateLimitExceeded, "slow down", Duration::from_secs(120)),
    StatusCode::TOO_MANY_REQUESTS
)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] err: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&err), status);
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> ErrorResponse {
    let response = ResponseError::error_response(&error);
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace-id header is set by error_response")
                .to_str()
                .expect("trace-id is valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => assert!(header.is_none(), "trace-id header should not be present"),
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("envelope deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_trace_id(
    #[from(internal_error_case)] internal_error: Error,
    expected_trace_id: String,
) {
    let envelope = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(envelope.status, EnvelopeStatus::Error);
    assert_eq!(envelope.message, "Internal server error");
    assert_eq!(envelope.error.code(), ErrorCode::InternalError);
    assert_eq!(envelope.error.trace_id(), Some(TRACE_ID));
    assert!(envelope.error.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details(
    #[from(invalid_request_case)] invalid_request: Error,
    expected_trace_id: String,
) {
    let envelope = assert_error_response(
        invalid_request,
        StatusCode::BAD_REQUEST,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(envelope.message, "deviceId is required");
    assert_eq!(envelope.error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        envelope.error.details(),
        Some(&json!({"field": "deviceId"}))
    );
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let envelope = assert_error_response(
        Error::not_found("pairing session not found"),
        StatusCode::NOT_FOUND,
        None,
    )
    .await;
    assert_eq!(envelope.error.trace_id(), None);
}

#[rstest]
#[case(ErrorCode::RateLimitExceeded, 60)]
#[case(ErrorCode::StrictRateLimitExceeded, 120)]
fn rate_limit_errors_set_retry_after(#[case] code: ErrorCode, #[case] seconds: u64) {
    let error = Error::rate_limited(code, "slow down", Duration::from_secs(seconds));
    let response = ResponseError::error_response(&error);

    let header = response
        .headers()
        .get(RETRY_AFTER)
        .expect("Retry-After header")
        .to_str()
        .expect("ascii header");
    assert_eq!(header, seconds.to_string());
}

#[rstest]
fn other_errors_have_no_retry_after() {
    let response = ResponseError::error_response(&Error::invalid_pairing_code("invalid"));
    assert!(response.headers().get(RETRY_AFTER).is_none());
}

#[rstest]
fn redaction_leaves_client_errors_untouched() {
    let error = Error::device_already_registered("device already registered");
    assert_eq!(redact_if_internal(&error), error);
}
