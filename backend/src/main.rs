//! Backend entry-point: loads settings, wires the pairing API, and serves it.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use runsight_backend::inbound::http::health::HealthState;
use runsight_backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use server::{ServerConfig, ServerSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let settings = ServerSettings::load().wrap_err("failed to load server settings")?;
    let config =
        ServerConfig::from_settings(&settings, session).wrap_err("invalid server settings")?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)
        .await
        .wrap_err("failed to start server")?;
    server.await.wrap_err("server terminated with an error")
}
