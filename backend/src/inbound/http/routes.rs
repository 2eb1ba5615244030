//! Route table for the versioned API.
//!
//! ```text
//! /api/v1
//!   /mobile                    cookie session
//!     /pairing                 login check, then pairing gate
//!       POST /request
//!       GET  /{session_id}/status
//!     GET    /devices
//!     DELETE /devices/{device_id}
//!   /iot
//!     /pairing                 verify gate
//!       POST /verify
//!     GET  /devices/config     device bearer token
//!     POST /devices/status     device bearer token
//! ```
//!
//! The lenient gate is mounted on the whole app by the server, so it also
//! covers the health probes.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::web;

use crate::inbound::http::admission::AdmissionGates;
use crate::inbound::http::devices::{
    device_config, list_devices, remove_device, update_device_status,
};
use crate::inbound::http::error::{json_error_handler, path_error_handler};
use crate::inbound::http::pairing::{pairing_status, request_pairing_code, verify_pairing_code};
use crate::inbound::http::session::RequireLogin;

/// Mount the API under `/api/v1`.
///
/// `HttpState` must be registered as app data by the caller.
pub fn configure_api(
    cfg: &mut web::ServiceConfig,
    gates: &AdmissionGates,
    session: SessionMiddleware<CookieSessionStore>,
) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/mobile")
                        .wrap(session)
                        .service(
                            web::scope("/pairing")
                                .wrap(gates.pairing())
                                .wrap(RequireLogin)
                                .service(request_pairing_code)
                                .service(pairing_status),
                        )
                        .service(list_devices)
                        .service(remove_device),
                )
                .service(
                    web::scope("/iot")
                        .service(
                            web::scope("/pairing")
                                .wrap(gates.verify())
                                .service(verify_pairing_code),
                        )
                        .service(device_config)
                        .service(update_device_status),
                ),
        );
}
