//! Bearer-token extractor for device endpoints.
//!
//! Devices authenticate with `Authorization: Bearer <token>` using the token
//! issued when they claimed a pairing code. A missing or malformed header is
//! treated as an empty token, which the device service rejects.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::Error;
use crate::domain::ports::AuthenticatedDeviceIdentity;
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "bearer ";

/// Device that presented an active bearer token.
#[derive(Debug, Clone)]
pub struct AuthenticatedDevice(pub AuthenticatedDeviceIdentity);

fn bearer_token(req: &HttpRequest) -> String {
    req.headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.split_at_checked(BEARER_PREFIX.len())?;
            scheme
                .eq_ignore_ascii_case(BEARER_PREFIX)
                .then(|| token.trim().to_owned())
        })
        .unwrap_or_default()
}

impl FromRequest for AuthenticatedDevice {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not configured"))?;
            let identity = state.devices_query.authenticate(token).await?;
            Ok(Self(identity))
        })
    }
}
