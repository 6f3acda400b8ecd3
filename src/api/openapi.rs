use super::handlers::{auth, health, runtime_config};
use crate::session::{
    backend::{AuthResponse, LoginRequest, UserProfile},
    Role,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login,
        auth::logout,
        runtime_config::runtime_config,
    ),
    components(schemas(
        health::Health,
        auth::ErrorBody,
        runtime_config::RuntimeConfig,
        LoginRequest,
        AuthResponse,
        UserProfile,
        Role,
    )),
    tags(
        (name = "health", description = "Liveness and build information"),
        (name = "auth", description = "Mocked authentication backend"),
        (name = "portal", description = "Front-end runtime configuration"),
    )
)]
struct ApiDoc;

/// `OpenAPI` document for everything the portal serves besides page shells.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
