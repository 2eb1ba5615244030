//! Unit tests for session configuration parsing.

use std::collections::HashMap;

use actix_web::{App, HttpResponse, test as actix_test, web};
use mockable::MockEnv;
use rstest::rstest;
use uuid::Uuid;

use super::*;
use crate::domain::{Error, UserId};
use crate::inbound::http::session::SessionContext;

#[derive(Debug)]
struct TempKeyFile {
    path: PathBuf,
}

impl TempKeyFile {
    fn new(len: usize) -> Self {
        let path = std::env::temp_dir().join(format!("runsight-session-key-{}", Uuid::new_v4()));
        std::fs::write(&path, vec![b'a'; len]).expect("key file creation should succeed");
        Self { path }
    }

    fn path_str(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for TempKeyFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

fn release_vars(key_file: &TempKeyFile) -> HashMap<&'static str, String> {
    HashMap::from([
        (KEY_FILE_ENV, key_file.path_str()),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ])
}

fn release_error(vars: HashMap<&'static str, String>) -> SessionConfigError {
    match session_settings_from_env(&mock_env(vars), BuildMode::Release) {
        Ok(_) => panic!("release settings should be rejected"),
        Err(error) => error,
    }
}

#[rstest]
#[case(COOKIE_SECURE_ENV)]
#[case(SAMESITE_ENV)]
#[case(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(#[case] missing: &'static str) {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.remove(missing);

    let error = release_error(vars);
    assert!(matches!(error, SessionConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(ALLOW_EPHEMERAL_ENV, "")]
#[case(SAMESITE_ENV, "sometimes")]
fn release_rejects_malformed_toggles(#[case] name: &'static str, #[case] value: &str) {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.insert(name, value.to_owned());

    let error = release_error(vars);
    assert!(matches!(error, SessionConfigError::InvalidEnv { name: got, .. } if got == name));
}

#[rstest]
fn release_refuses_ephemeral_keys() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.insert(ALLOW_EPHEMERAL_ENV, "yes".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::EphemeralNotAllowed
    ));
}

#[rstest]
fn release_refuses_missing_key_file() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.insert(KEY_FILE_ENV, "/nonexistent/runsight/session_key".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::KeyRead { .. }
    ));
}

#[rstest]
#[case(BuildMode::Release, 32, SESSION_KEY_MIN_LEN)]
#[case(BuildMode::Debug, 16, SESSION_KEY_DERIVE_MIN_LEN)]
fn short_keys_are_rejected(#[case] mode: BuildMode, #[case] len: usize, #[case] min: usize) {
    let key_file = TempKeyFile::new(len);
    let env = mock_env(release_vars(&key_file));

    match session_settings_from_env(&env, mode) {
        Err(SessionConfigError::KeyTooShort {
            length, min_len, ..
        }) => {
            assert_eq!(length, len);
            assert_eq!(min_len, min);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("short key should be rejected"),
    }
}

#[rstest]
fn release_refuses_insecure_same_site_none() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let mut vars = release_vars(&key_file);
    vars.insert(COOKIE_SECURE_ENV, "0".to_owned());
    vars.insert(SAMESITE_ENV, "None".to_owned());

    assert!(matches!(
        release_error(vars),
        SessionConfigError::InsecureSameSiteNone
    ));
}

#[rstest]
fn release_accepts_complete_settings() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let env = mock_env(release_vars(&key_file));

    let settings =
        session_settings_from_env(&env, BuildMode::Release).expect("settings should be valid");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    let same_key = SessionSettings {
        key: Key::derive_from(&[b'a'; SESSION_KEY_MIN_LEN]),
        cookie_secure: true,
        same_site: SameSite::Strict,
    };
    assert_eq!(settings.key_fingerprint(), same_key.key_fingerprint());
}

#[rstest]
fn fingerprint_is_short_lowercase_hex_and_key_specific() {
    let settings_for = |byte: u8| SessionSettings {
        key: Key::derive_from(&[byte; SESSION_KEY_MIN_LEN]),
        cookie_secure: true,
        same_site: SameSite::Strict,
    };

    let fingerprint = settings_for(b'a').key_fingerprint();

    assert_eq!(fingerprint.len(), FINGERPRINT_BYTES * 2);
    assert!(
        fingerprint
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    );
    assert_ne!(fingerprint, settings_for(b'b').key_fingerprint());
}

#[rstest]
fn debug_falls_back_to_defaults() {
    let mut vars = HashMap::new();
    vars.insert(KEY_FILE_ENV, "/nonexistent/runsight/session_key".to_owned());
    vars.insert(SAMESITE_ENV, "unexpected".to_owned());
    let env = mock_env(vars);

    let settings =
        session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults should succeed");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
}

#[actix_web::test]
async fn middleware_sets_hardened_session_cookie() {
    let key_file = TempKeyFile::new(SESSION_KEY_MIN_LEN);
    let settings = session_settings_from_env(&mock_env(release_vars(&key_file)), BuildMode::Release)
        .expect("settings should be valid");
    let app = actix_test::init_service(App::new().wrap(settings.middleware()).route(
        "/login",
        web::post().to(|session: SessionContext| async move {
            session.persist_user(&UserId::random())?;
            Ok::<_, Error>(HttpResponse::NoContent().finish())
        }),
    ))
    .await;

    let res = actix_test::call_service(&app, actix_test::TestRequest::post().uri("/login").to_request()).await;
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned();
    assert_eq!(cookie.secure(), Some(true));
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    assert_eq!(cookie.path(), Some("/"));
}
