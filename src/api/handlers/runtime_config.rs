//! Public front-end settings, so a static deployment can point at another auth
//! API without a rebuild. Nothing here is secret.

use crate::config::PortalConfig;
use axum::{extract::Extension, response::Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_base_url: String,
    pub login_path: String,
    pub cookie_max_age_seconds: u64,
}

impl From<&PortalConfig> for RuntimeConfig {
    fn from(config: &PortalConfig) -> Self {
        Self {
            api_base_url: config.auth_base_url().to_string(),
            login_path: config.login_path().to_string(),
            cookie_max_age_seconds: config.cookie_max_age().as_secs(),
        }
    }
}

#[utoipa::path(
    get,
    path= "/runtime-config.json",
    responses (
        (status = 200, description = "Public front-end configuration", body = RuntimeConfig),
    ),
    tag= "portal"
)]
pub async fn runtime_config(config: Extension<Arc<PortalConfig>>) -> Json<RuntimeConfig> {
    Json(RuntimeConfig::from(config.0.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_portal_config() {
        let config = PortalConfig::new().with_cookie_max_age_days(2);
        let runtime = RuntimeConfig::from(&config);
        assert_eq!(runtime.api_base_url, "https://api.electrocentro.fake/v1");
        assert_eq!(runtime.login_path, "/login");
        assert_eq!(runtime.cookie_max_age_seconds, 172_800);
    }
}
