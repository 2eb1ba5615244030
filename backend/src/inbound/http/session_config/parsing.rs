//! Toggle parsing for the session environment.
//!
//! Release builds turn every missing or malformed value into an error. Debug
//! builds log the problem and continue with the fallback.

use actix_web::cookie::SameSite;
use mockable::Env;
use tracing::warn;

use super::{BuildMode, SAMESITE_ENV, SessionConfigError};

const FLAG_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Boolean environment toggle with its debug-build fallback.
pub(super) struct Toggle {
    name: &'static str,
    fallback: bool,
}

impl Toggle {
    pub(super) const fn new(name: &'static str, fallback: bool) -> Self {
        Self { name, fallback }
    }

    /// Read the toggle, applying the build-mode policy to bad values.
    pub(super) fn read<E: Env>(&self, env: &E, mode: BuildMode) -> Result<bool, SessionConfigError> {
        let Some(raw) = env.string(self.name) else {
            return fallback_in_debug(
                mode,
                self.fallback,
                SessionConfigError::MissingEnv { name: self.name },
            );
        };
        match flag(&raw) {
            Some(value) => Ok(value),
            None => fallback_in_debug(
                mode,
                self.fallback,
                SessionConfigError::InvalidEnv {
                    name: self.name,
                    value: raw,
                    expected: FLAG_EXPECTED,
                },
            ),
        }
    }
}

/// `Ok(fallback)` with a warning in debug builds, `Err(error)` in release.
pub(super) fn fallback_in_debug<T>(
    mode: BuildMode,
    fallback: T,
    error: SessionConfigError,
) -> Result<T, SessionConfigError> {
    if mode.is_debug() {
        warn!(error = %error, "session setting ignored in debug build");
        Ok(fallback)
    } else {
        Err(error)
    }
}

/// Parse a `SameSite` policy name, case-insensitively.
///
/// `None` demands a secure cookie; debug builds only warn about it.
pub(super) fn same_site(
    raw: String,
    mode: BuildMode,
    cookie_secure: bool,
    fallback: SameSite,
) -> Result<SameSite, SessionConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" => fallback_in_debug(mode, (), SessionConfigError::InsecureSameSiteNone)
            .map(|()| SameSite::None),
        _ => fallback_in_debug(
            mode,
            fallback,
            SessionConfigError::InvalidEnv {
                name: SAMESITE_ENV,
                value: raw,
                expected: SAMESITE_EXPECTED,
            },
        ),
    }
}

fn flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
