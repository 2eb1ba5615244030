//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects every HTTP endpoint from the inbound layer together
//! with the schema wrappers in [`crate::inbound::http::schemas`]. Two security
//! schemes are registered: the mobile session cookie and the device bearer
//! token. Swagger UI serves the document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::schemas::{
    DeviceConfigSchema, DeviceListSchema, DeviceSummarySchema, ErrorCodeSchema,
    ErrorEnvelopeSchema, ErrorSchema, PairingCodeSchema, PairingStatusSchema,
    PairingVerifiedSchema,
};

/// Adds the cookie and bearer security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by the account service.",
            ))),
        );
        components.add_security_scheme(
            "DeviceBearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Device token returned by pairing verification."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Runsight backend API",
        description = "Device pairing and device management for run-tracking wearables."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::pairing::request_pairing_code,
        crate::inbound::http::pairing::pairing_status,
        crate::inbound::http::pairing::verify_pairing_code,
        crate::inbound::http::devices::list_devices,
        crate::inbound::http::devices::remove_device,
        crate::inbound::http::devices::device_config,
        crate::inbound::http::devices::update_device_status,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ErrorEnvelopeSchema,
        DeviceConfigSchema,
        DeviceSummarySchema,
        DeviceListSchema,
        PairingCodeSchema,
        PairingVerifiedSchema,
        PairingStatusSchema,
    )),
    tags(
        (name = "pairing", description = "Pairing codes for wearable devices"),
        (name = "devices", description = "Paired device management"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
