//! Builders for the HTTP state from configured storage.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use runsight_backend::domain::ports::{DeviceRepository, PairingRepository};
use runsight_backend::domain::{DeviceService, PairingService};
use runsight_backend::inbound::http::state::HttpState;
use runsight_backend::outbound::memory::InMemoryPairingStore;
use runsight_backend::outbound::persistence::{
    DbPool, DieselDeviceRepository, DieselPairingRepository, PoolConfig, PoolError, run_migrations,
};
use runsight_backend::outbound::random::OsRandomSource;

/// Wire the pairing and device services over one pair of repositories.
fn state_over<P, D>(sessions: Arc<P>, devices: Arc<D>, clock: Arc<dyn Clock>) -> HttpState
where
    P: PairingRepository + 'static,
    D: DeviceRepository + 'static,
{
    let pairing = PairingService::new(
        sessions,
        devices.clone(),
        Arc::new(OsRandomSource),
        clock.clone(),
    );
    HttpState::from_services(
        Arc::new(pairing),
        Arc::new(DeviceService::new(devices, clock)),
    )
}

/// Build handler state over PostgreSQL when `database_url` is set, otherwise
/// over the process-local store.
///
/// # Errors
/// Returns [`PoolError`] when migrations fail or the pool cannot be built.
pub async fn build_http_state(
    database_url: Option<&str>,
    clock: Arc<dyn Clock>,
) -> Result<HttpState, PoolError> {
    match database_url {
        Some(url) => {
            run_migrations(url).await?;
            let pool = DbPool::new(PoolConfig::new(url)).await?;
            info!("pairing store backed by PostgreSQL");
            Ok(state_over(
                Arc::new(DieselPairingRepository::new(pool.clone())),
                Arc::new(DieselDeviceRepository::new(pool)),
                clock,
            ))
        }
        None => {
            warn!("no database configured; pairing state is process-local and lost on restart");
            let store = Arc::new(InMemoryPairingStore::new());
            Ok(state_over(store.clone(), store, clock))
        }
    }
}
