use crate::{api, cli::telemetry, config::PortalConfig};
use anyhow::Result;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub auth_base_url: Url,
    pub cookie_max_age_days: u64,
}

impl Args {
    #[must_use]
    pub fn portal_config(&self) -> PortalConfig {
        PortalConfig::new()
            .with_auth_base_url(&self.auth_base_url)
            .with_cookie_max_age_days(self.cookie_max_age_days)
    }
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("auth_base_url", args.auth_base_url.to_string()),
        ("cookie_max_age_days", args.cookie_max_age_days.to_string()),
    ];
    for (key, value) in entries {
        info!("{key}: {value}");
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let config = args.portal_config();
    let result = api::new(args.port, config).await;

    telemetry::shutdown_tracer();

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn args_build_portal_config() {
        let args = Args {
            port: 8080,
            auth_base_url: Url::parse("http://127.0.0.1:9000/v1/").unwrap_or_else(|err| panic!("{err}")),
            cookie_max_age_days: 2,
        };
        let config = args.portal_config();
        assert_eq!(config.auth_base_url(), "http://127.0.0.1:9000/v1");
        assert_eq!(config.cookie_max_age(), Duration::from_secs(172_800));
    }
}
