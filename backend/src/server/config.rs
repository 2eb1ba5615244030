//! HTTP server configuration object.

use std::net::SocketAddr;
use std::time::Duration;

use runsight_backend::inbound::http::admission::AdmissionLimits;
use runsight_backend::inbound::http::session_config::SessionSettings;

use super::settings::{ServerSettings, SettingsError};

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) limits: AdmissionLimits,
    pub(crate) sweep_interval: Duration,
    pub(crate) database_url: Option<String>,
}

impl ServerConfig {
    /// In-memory storage and default admission limits.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            limits: AdmissionLimits::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            database_url: None,
        }
    }

    /// Resolve loaded settings into a server configuration.
    ///
    /// # Errors
    /// Returns [`SettingsError`] for a malformed bind address or a zero sweep
    /// interval.
    pub fn from_settings(
        settings: &ServerSettings,
        session: SessionSettings,
    ) -> Result<Self, SettingsError> {
        let config = Self::new(session, settings.bind_addr()?)
            .with_admission(settings.admission_limits(), settings.sweep_interval()?);
        Ok(match settings.database_url() {
            Some(url) => config.with_database_url(url),
            None => config,
        })
    }

    /// Override the admission gate sizes and sweep cadence.
    #[must_use]
    pub fn with_admission(mut self, limits: AdmissionLimits, sweep_interval: Duration) -> Self {
        self.limits = limits;
        self.sweep_interval = sweep_interval;
        self
    }

    /// Persist pairing state in PostgreSQL.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }
}
