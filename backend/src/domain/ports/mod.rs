//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`RandomSource`]) are implemented by outbound
//! adapters. Driving ports (`*Command`, `*Query`) are implemented by domain
//! services and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod device_command;
mod device_query;
mod device_repository;
mod pairing_command;
mod pairing_query;
mod pairing_repository;
mod random_source;

#[cfg(test)]
pub use device_command::MockDeviceCommand;
pub use device_command::{
    DeviceCommand, DeviceStatusUpdated, RemoveDeviceRequest, UpdateDeviceStatusRequest,
};
#[cfg(test)]
pub use device_query::MockDeviceQuery;
pub use device_query::{
    AuthenticatedDeviceIdentity, DeviceQuery, DeviceSummary, ListDevicesResponse,
};
#[cfg(test)]
pub use device_repository::MockDeviceRepository;
pub use device_repository::{DeviceRepository, DeviceRepositoryError};
#[cfg(test)]
pub use pairing_command::MockPairingCommand;
pub use pairing_command::{
    PairingCommand, RequestPairingCodeRequest, RequestPairingCodeResponse,
    VerifyPairingCodeRequest, VerifyPairingCodeResponse,
};
#[cfg(test)]
pub use pairing_query::MockPairingQuery;
pub use pairing_query::{PairingQuery, PairingStatusRequest, PairingStatusResponse};
#[cfg(test)]
pub use pairing_repository::MockPairingRepository;
pub use pairing_repository::{PairingClaim, PairingRepository, PairingRepositoryError};
#[cfg(test)]
pub use random_source::MockRandomSource;
pub use random_source::{RandomSource, RandomSourceError};
