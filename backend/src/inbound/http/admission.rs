//! Admission control middleware.
//!
//! [`AdmissionGate`] wraps a scope and debits one token per request from the
//! caller's bucket in an [`AdmissionController`]. Rejected requests never
//! reach the wrapped service; they receive the policy's `429` envelope with a
//! `Retry-After` header.

use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, ResponseError};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use mockable::Clock;
use tracing::warn;

use super::client_identity::client_key;
use crate::domain::admission::{AdmissionController, AdmissionPolicy, AdmissionPolicyError};

/// Middleware factory admitting requests against one controller.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use actix_web::{App, web};
/// use mockable::DefaultClock;
/// use runsight_backend::domain::admission::{AdmissionController, AdmissionPolicy};
/// use runsight_backend::inbound::http::admission::AdmissionGate;
///
/// let policy = AdmissionPolicy::strict(5).expect("valid policy");
/// let controller = Arc::new(AdmissionController::new(policy, Arc::new(DefaultClock)));
/// let app = App::new().service(web::scope("/pairing").wrap(AdmissionGate::new(controller)));
/// ```
#[derive(Clone)]
pub struct AdmissionGate {
    controller: Arc<AdmissionController>,
}

impl AdmissionGate {
    /// Gate requests through `controller`.
    pub fn new(controller: Arc<AdmissionController>) -> Self {
        Self { controller }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdmissionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AdmissionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdmissionMiddleware {
            service,
            controller: self.controller.clone(),
        }))
    }
}

/// Service wrapper produced by [`AdmissionGate`].
pub struct AdmissionMiddleware<S> {
    service: S,
    controller: Arc<AdmissionController>,
}

impl<S, B> Service<ServiceRequest> for AdmissionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let key = client_key(req.request());
        if self.controller.admit(&key) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let policy = *self.controller.policy();
        // Built inside the future so the rejection picks up the request's
        // trace id from the enclosing `Trace` scope.
        Box::pin(async move {
            let error = policy.rejection();
            warn!(
                client_key = %key,
                policy = %policy.kind(),
                method = %req.method(),
                path = req.path(),
                "request rejected by admission control"
            );
            let response = error.error_response().map_into_right_body();
            Ok(req.into_response(response))
        })
    }
}

/// Bucket sizes for the three gates mounted by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionLimits {
    /// Sustained global rate.
    pub requests_per_second: u32,
    /// Global burst.
    pub burst: u32,
    /// Sustained rate for pairing code issuance and status polls.
    pub pairing_per_minute: u32,
    /// Sustained rate for pairing code verification.
    pub verify_per_minute: u32,
}

impl Default for AdmissionLimits {
    fn default() -> Self {
        Self {
            requests_per_second: 100,
            burst: 200,
            pairing_per_minute: 20,
            verify_per_minute: 5,
        }
    }
}

/// Controllers backing the global and sensitive-endpoint gates.
#[derive(Clone)]
pub struct AdmissionGates {
    lenient: Arc<AdmissionController>,
    pairing: Arc<AdmissionController>,
    verify: Arc<AdmissionController>,
}

impl AdmissionGates {
    /// Build one controller per gate, all reading `clock`.
    ///
    /// # Errors
    /// Returns [`AdmissionPolicyError`] when any limit is zero.
    pub fn new(limits: AdmissionLimits, clock: Arc<dyn Clock>) -> Result<Self, AdmissionPolicyError> {
        let lenient = AdmissionPolicy::lenient(limits.requests_per_second, limits.burst)?;
        let pairing = AdmissionPolicy::strict(limits.pairing_per_minute)?;
        let verify = AdmissionPolicy::strict(limits.verify_per_minute)?;
        Ok(Self {
            lenient: Arc::new(AdmissionController::new(lenient, clock.clone())),
            pairing: Arc::new(AdmissionController::new(pairing, clock.clone())),
            verify: Arc::new(AdmissionController::new(verify, clock)),
        })
    }

    /// Gate applied to every request the server handles.
    #[must_use]
    pub fn lenient(&self) -> AdmissionGate {
        AdmissionGate::new(self.lenient.clone())
    }

    /// Gate for pairing code issuance and status polls.
    #[must_use]
    pub fn pairing(&self) -> AdmissionGate {
        AdmissionGate::new(self.pairing.clone())
    }

    /// Gate for pairing code verification.
    #[must_use]
    pub fn verify(&self) -> AdmissionGate {
        AdmissionGate::new(self.verify.clone())
    }

    /// Every controller, for spawning sweepers.
    #[must_use]
    pub fn controllers(&self) -> [Arc<AdmissionController>; 3] {
        [
            self.lenient.clone(),
            self.pairing.clone(),
            self.verify.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::http::header::RETRY_AFTER;
    use actix_web::{App, HttpResponse, test as actix_test, web};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;
    use serde_json::Value;

    use super::*;
    use crate::domain::TRACE_ID_HEADER;
    use crate::middleware::Trace;
    use crate::test_support::MutableClock;

    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
        ))
    }

    fn strict_controller(clock: Arc<MutableClock>) -> Arc<AdmissionController> {
        let policy = AdmissionPolicy::strict(5).expect("valid policy");
        Arc::new(AdmissionController::new(policy, clock))
    }

    fn from_client(ip: &str) -> actix_test::TestRequest {
        actix_test::TestRequest::post()
            .uri("/gated")
            .insert_header(("X-Forwarded-For", ip))
    }

    macro_rules! gated_app {
        ($controller:expr) => {
            actix_test::init_service(
                App::new().wrap(Trace).service(
                    web::scope("")
                        .wrap(AdmissionGate::new($controller))
                        .route(
                            "/gated",
                            web::post().to(|| async { HttpResponse::Ok().finish() }),
                        ),
                ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn rejects_after_burst_with_retry_after() {
        let app = gated_app!(strict_controller(clock()));

        for _ in 0..2 {
            let res = actix_test::call_service(&app, from_client("203.0.113.1").to_request()).await;
            assert_eq!(res.status(), StatusCode::OK);
        }
        let res = actix_test::call_service(&app, from_client("203.0.113.1").to_request()).await;
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after = res
            .headers()
            .get(RETRY_AFTER)
            .expect("Retry-After header")
            .to_str()
            .expect("ascii header")
            .to_owned();
        assert_eq!(retry_after, "120");

        let header_trace = res
            .headers()
            .get(TRACE_ID_HEADER)
            .expect("trace-id header")
            .to_str()
            .expect("ascii header")
            .to_owned();
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"]["code"], "strict_rate_limit_exceeded");
        assert_eq!(body["error"]["traceId"], header_trace.as_str());
    }

    #[actix_web::test]
    async fn clients_have_independent_buckets() {
        let app = gated_app!(strict_controller(clock()));

        for _ in 0..2 {
            actix_test::call_service(&app, from_client("203.0.113.1").to_request()).await;
        }
        let blocked = actix_test::call_service(&app, from_client("203.0.113.1").to_request()).await;
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        let other = actix_test::call_service(&app, from_client("203.0.113.2").to_request()).await;
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn refill_readmits_the_client() {
        let clock = clock();
        let app = gated_app!(strict_controller(clock.clone()));

        for _ in 0..2 {
            actix_test::call_service(&app, from_client("203.0.113.1").to_request()).await;
        }
        clock.advance(Duration::from_secs(12));
        let res = actix_test::call_service(&app, from_client("203.0.113.1").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[rstest]
    #[case(AdmissionLimits { requests_per_second: 0, ..AdmissionLimits::default() })]
    #[case(AdmissionLimits { burst: 0, ..AdmissionLimits::default() })]
    #[case(AdmissionLimits { pairing_per_minute: 0, ..AdmissionLimits::default() })]
    #[case(AdmissionLimits { verify_per_minute: 0, ..AdmissionLimits::default() })]
    fn zero_limits_are_rejected(#[case] limits: AdmissionLimits) {
        assert!(AdmissionGates::new(limits, clock()).is_err());
    }

    #[rstest]
    fn gates_use_distinct_controllers() {
        let gates = AdmissionGates::new(AdmissionLimits::default(), clock()).expect("valid limits");
        let [lenient, pairing, verify] = gates.controllers();
        assert_eq!(lenient.policy().burst(), 200);
        assert_eq!(pairing.policy().refill_tokens(), 20);
        assert_eq!(verify.policy().refill_tokens(), 5);
        assert!(!Arc::ptr_eq(&pairing, &verify));
    }
}
