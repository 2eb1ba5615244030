//! Mobile user identity carried by the account service's session cookie.
//!
//! The account service signs the user in and stores the user id in a private
//! cookie session keyed with a secret it shares with this backend. Handlers
//! extract [`SessionContext`] and ask it for the caller's [`UserId`].
//! [`RequireLogin`] turns anonymous callers away before a scope's other
//! middleware runs.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_session::{Session, SessionExt};
use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{FromRequest, HttpRequest, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::debug;

use crate::domain::{Error, UserId};

/// Session key holding the signed-in user's id.
pub(crate) const USER_ID_KEY: &str = "user_id";

fn login_required() -> Error {
    Error::unauthorized("login required")
}

/// Extractor over the cookie session.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Record `user_id` as the signed-in user.
    ///
    /// Production cookies are written by the account service; this exists for
    /// that service's contract tests and local tooling.
    ///
    /// # Errors
    /// Returns an internal error when the session cannot be serialised.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, user_id)
            .map_err(|error| Error::internal(format!("session write failed: {error}")))
    }

    /// The signed-in user.
    ///
    /// # Errors
    /// `unauthorized` when no user is signed in or the stored id is not a
    /// UUID; `internal_error` when the session state cannot be decoded.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        let stored = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("session read failed: {error}")))?
            .ok_or_else(login_required)?;
        UserId::new(&stored).map_err(|error| {
            debug!(%error, "session cookie carries a malformed user id");
            login_required()
        })
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { Ok(Self(session.await?)) })
    }
}

/// Middleware answering `401` when no user is signed in.
///
/// Must be mounted inside the session middleware.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireLogin;

impl<S, B> Transform<S, ServiceRequest> for RequireLogin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RequireLoginMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireLoginMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Service wrapper produced by [`RequireLogin`].
pub struct RequireLoginMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireLoginMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let session = SessionContext(req.get_session());
            if let Err(error) = session.require_user_id() {
                debug!(path = req.path(), "anonymous request turned away");
                let response = error.error_response().map_into_right_body();
                return Ok(req.into_response(response));
            }
            service
                .call(req)
                .await
                .map(ServiceResponse::map_into_left_body)
        })
    }
}
