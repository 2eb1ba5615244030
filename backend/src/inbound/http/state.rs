//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{DeviceCommand, DeviceQuery, PairingCommand, PairingQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Issue and claim pairing codes.
    pub pairing: Arc<dyn PairingCommand>,
    /// Poll pairing session status.
    pub pairing_query: Arc<dyn PairingQuery>,
    /// Revoke devices.
    pub devices: Arc<dyn DeviceCommand>,
    /// List devices and authenticate device tokens.
    pub devices_query: Arc<dyn DeviceQuery>,
}

impl HttpState {
    /// Build state from one pairing service and one device service, each
    /// serving both halves of its command/query pair.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use runsight_backend::domain::{DeviceService, PairingService};
    /// use runsight_backend::inbound::http::state::HttpState;
    /// use runsight_backend::outbound::memory::InMemoryPairingStore;
    /// use runsight_backend::outbound::random::OsRandomSource;
    ///
    /// let store = Arc::new(InMemoryPairingStore::new());
    /// let pairing = PairingService::new(
    ///     store.clone(),
    ///     store.clone(),
    ///     Arc::new(OsRandomSource),
    ///     Arc::new(DefaultClock),
    /// );
    /// let devices = DeviceService::new(store, Arc::new(DefaultClock));
    /// let state = HttpState::from_services(Arc::new(pairing), Arc::new(devices));
    /// let _pairing = state.pairing.clone();
    /// ```
    pub fn from_services<P, D>(pairing: Arc<P>, devices: Arc<D>) -> Self
    where
        P: PairingCommand + PairingQuery + 'static,
        D: DeviceCommand + DeviceQuery + 'static,
    {
        Self {
            pairing: pairing.clone(),
            pairing_query: pairing,
            devices: devices.clone(),
            devices_query: devices,
        }
    }
}
