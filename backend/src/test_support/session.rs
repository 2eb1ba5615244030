//! Cookie-session helpers standing in for the account service login.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::{App, HttpResponse, test, web};

use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;

/// Name of the session cookie shared with the account service.
pub const SESSION_COOKIE: &str = "session";

/// Session middleware for plain-HTTP tests, signing with `key`.
pub fn session_middleware(key: Key) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(false)
        .build()
}

/// Mint a session cookie for `user_id` signed with `key`.
///
/// Any app wrapping [`session_middleware`] with the same key accepts it.
///
/// # Examples
/// ```
/// use actix_web::cookie::Key;
/// use runsight_backend::domain::UserId;
/// use runsight_backend::test_support::session::login_cookie;
///
/// # actix_web::rt::System::new().block_on(async {
/// let cookie = login_cookie(&Key::generate(), &UserId::random()).await;
/// assert_eq!(cookie.name(), "session");
/// # });
/// ```
pub async fn login_cookie(key: &Key, user_id: &UserId) -> Cookie<'static> {
    let id = *user_id;
    let app = test::init_service(
        App::new().wrap(session_middleware(key.clone())).route(
            "/login",
            web::post().to(move |session: SessionContext| async move {
                session.persist_user(&id)?;
                Ok::<_, Error>(HttpResponse::NoContent().finish())
            }),
        ),
    )
    .await;
    let res = test::call_service(&app, test::TestRequest::post().uri("/login").to_request()).await;
    assert!(res.status().is_success(), "login route failed: {}", res.status());
    match res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
    {
        Some(cookie) => cookie.into_owned(),
        None => panic!("login route did not set a session cookie"),
    }
}
