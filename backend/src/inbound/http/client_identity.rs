//! Client identity used to key admission buckets.
//!
//! The first `X-Forwarded-For` entry wins when present, otherwise the peer
//! address. Requests with neither share the `unknown` bucket.

use actix_web::HttpRequest;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Derive the admission key for `req`.
///
/// # Examples
/// ```
/// use actix_web::test::TestRequest;
/// use runsight_backend::inbound::http::client_identity::client_key;
///
/// let req = TestRequest::default()
///     .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
///     .to_http_request();
/// assert_eq!(client_key(&req), "203.0.113.7");
/// ```
#[must_use]
pub fn client_key(req: &HttpRequest) -> String {
    let forwarded = req
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());
    if let Some(first) = forwarded {
        return first.to_owned();
    }
    req.peer_addr()
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |addr| addr.ip().to_string())
}
