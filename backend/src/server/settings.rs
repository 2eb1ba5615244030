//! Server settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `RUNSIGHT_*` environment variables, or a
//! configuration file, and are read once at startup.

use std::net::SocketAddr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use runsight_backend::inbound::http::admission::AdmissionLimits;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address '{value}'")]
    InvalidBindAddr { value: String },
    #[error("sweep interval must be at least one second")]
    ZeroSweepInterval,
}

/// Listener, storage, and admission settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RUNSIGHT")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Lenient policy sustained rate.
    pub requests_per_second: Option<u32>,
    /// Lenient policy burst.
    pub burst: Option<u32>,
    /// Strict policy rate for pairing code issuance and status polls.
    pub pairing_per_minute: Option<u32>,
    /// Strict policy rate for pairing code verification.
    pub verify_per_minute: Option<u32>,
    /// Seconds between idle-bucket sweeps.
    pub sweep_interval_secs: Option<u64>,
}

impl ServerSettings {
    /// Parsed listener address, defaulting to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidBindAddr {
                value: value.to_owned(),
            })
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Gate sizes with unset values taken from [`AdmissionLimits::default`].
    pub fn admission_limits(&self) -> AdmissionLimits {
        let defaults = AdmissionLimits::default();
        AdmissionLimits {
            requests_per_second: self
                .requests_per_second
                .unwrap_or(defaults.requests_per_second),
            burst: self.burst.unwrap_or(defaults.burst),
            pairing_per_minute: self
                .pairing_per_minute
                .unwrap_or(defaults.pairing_per_minute),
            verify_per_minute: self
                .verify_per_minute
                .unwrap_or(defaults.verify_per_minute),
        }
    }

    /// Interval between admission sweeps, defaulting to five minutes.
    pub fn sweep_interval(&self) -> Result<Duration, SettingsError> {
        match self.sweep_interval_secs.unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS) {
            0 => Err(SettingsError::ZeroSweepInterval),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 7] = [
        "RUNSIGHT_BIND_ADDR",
        "RUNSIGHT_DATABASE_URL",
        "RUNSIGHT_REQUESTS_PER_SECOND",
        "RUNSIGHT_BURST",
        "RUNSIGHT_PAIRING_PER_MINUTE",
        "RUNSIGHT_VERIFY_PER_MINUTE",
        "RUNSIGHT_SWEEP_INTERVAL_SECS",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("runsight")]).expect("config should load")
    }

    fn settings() -> ServerSettings {
        ServerSettings {
            bind_addr: None,
            database_url: None,
            requests_per_second: None,
            burst: None,
            pairing_per_minute: None,
            verify_per_minute: None,
            sweep_interval_secs: None,
        }
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([0, 0, 0, 0], 8080)))
        );
        assert!(settings.database_url().is_none());
        assert_eq!(settings.admission_limits(), AdmissionLimits::default());
        assert_eq!(settings.sweep_interval(), Ok(Duration::from_secs(300)));
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("RUNSIGHT_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "RUNSIGHT_DATABASE_URL",
                Some("postgres://localhost/runsight".to_owned()),
            ),
            ("RUNSIGHT_REQUESTS_PER_SECOND", Some("10".to_owned())),
            ("RUNSIGHT_BURST", Some("20".to_owned())),
            ("RUNSIGHT_PAIRING_PER_MINUTE", Some("6".to_owned())),
            ("RUNSIGHT_VERIFY_PER_MINUTE", Some("3".to_owned())),
            ("RUNSIGHT_SWEEP_INTERVAL_SECS", Some("60".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr(),
            Ok(SocketAddr::from(([127, 0, 0, 1], 9000)))
        );
        assert_eq!(
            settings.database_url(),
            Some("postgres://localhost/runsight")
        );
        assert_eq!(
            settings.admission_limits(),
            AdmissionLimits {
                requests_per_second: 10,
                burst: 20,
                pairing_per_minute: 6,
                verify_per_minute: 3,
            }
        );
        assert_eq!(settings.sweep_interval(), Ok(Duration::from_secs(60)));
    }

    #[rstest]
    #[case("localhost")]
    #[case("0.0.0.0")]
    #[case("")]
    fn malformed_bind_addresses_are_rejected(#[case] value: &str) {
        let settings = ServerSettings {
            bind_addr: Some(value.to_owned()),
            ..settings()
        };
        assert!(matches!(
            settings.bind_addr(),
            Err(SettingsError::InvalidBindAddr { .. })
        ));
    }

    #[rstest]
    fn zero_sweep_interval_is_rejected() {
        let settings = ServerSettings {
            sweep_interval_secs: Some(0),
            ..settings()
        };
        assert_eq!(
            settings.sweep_interval(),
            Err(SettingsError::ZeroSweepInterval)
        );
    }

    #[rstest]
    fn blank_database_url_means_in_memory() {
        let settings = ServerSettings {
            database_url: Some("  ".to_owned()),
            ..settings()
        };
        assert!(settings.database_url().is_none());
    }
}
