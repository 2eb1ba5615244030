//! Server construction and middleware wiring.

mod config;
mod settings;
mod state_builders;

pub use config::ServerConfig;
pub use settings::ServerSettings;

use state_builders::build_http_state;

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use tracing::info;

use runsight_backend::Trace;
#[cfg(debug_assertions)]
use runsight_backend::doc::ApiDoc;
use runsight_backend::domain::admission::run_sweeper;
use runsight_backend::inbound::http::admission::AdmissionGates;
use runsight_backend::inbound::http::health::{HealthState, live, ready};
use runsight_backend::inbound::http::routes::configure_api;
use runsight_backend::inbound::http::session_config::SessionSettings;
use runsight_backend::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    gates: AdmissionGates,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        gates,
        session,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(gates.lenient())
        .wrap(Trace)
        .configure(|cfg| configure_api(cfg, &gates, session.middleware()))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// Builds the pairing store (running migrations when a database is
/// configured), creates the admission gates, and spawns one idle-bucket
/// sweeper per gate on the current runtime.
///
/// # Errors
/// Propagates [`std::io::Error`] when storage cannot be prepared, a limit is
/// zero, or binding the socket fails.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        session,
        bind_addr,
        limits,
        sweep_interval,
        database_url,
    } = config;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let http_state = build_http_state(database_url.as_deref(), clock.clone())
        .await
        .map_err(|e| std::io::Error::other(format!("pairing store setup failed: {e}")))?;
    let http_state = web::Data::new(http_state);
    let gates = AdmissionGates::new(limits, clock)
        .map_err(|e| std::io::Error::other(format!("admission policy invalid: {e}")))?;

    for controller in gates.controllers() {
        actix_web::rt::spawn(run_sweeper(controller, sweep_interval));
    }

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            gates: gates.clone(),
            session: session.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, sweep_interval_secs = sweep_interval.as_secs(), "server listening");
    health_state.mark_ready();
    Ok(server)
}
