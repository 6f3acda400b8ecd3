//! Portal configuration shared by the server, the guards and the client core.

use std::time::Duration;
use url::Url;

pub const DEFAULT_AUTH_BASE_URL: &str = "https://api.electrocentro.fake/v1";
pub const DEFAULT_COOKIE_MAX_AGE_DAYS: u64 = 7;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalConfig {
    auth_base_url: String,
    login_path: String,
    landing_path: String,
    public_paths: Vec<String>,
    exempt_prefixes: Vec<String>,
    cookie_max_age: Duration,
    request_timeout: Duration,
}

impl PortalConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.to_string(),
            login_path: "/login".to_string(),
            landing_path: "/".to_string(),
            public_paths: vec!["/".to_string(), "/login".to_string(), "/registro".to_string()],
            exempt_prefixes: vec!["/static/".to_string(), "/favicon.ico".to_string()],
            cookie_max_age: Duration::from_secs(DEFAULT_COOKIE_MAX_AGE_DAYS * SECONDS_PER_DAY),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        }
    }

    /// Base address of the auth API. Trailing slashes are dropped.
    #[must_use]
    pub fn with_auth_base_url(mut self, url: &Url) -> Self {
        self.auth_base_url = url.as_str().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: &str) -> Self {
        self.login_path = path.to_string();
        self
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: &str) -> Self {
        self.landing_path = path.to_string();
        self
    }

    #[must_use]
    pub fn with_public_paths(mut self, paths: Vec<String>) -> Self {
        self.public_paths = paths;
        self
    }

    #[must_use]
    pub fn with_exempt_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.exempt_prefixes = prefixes;
        self
    }

    #[must_use]
    pub fn with_cookie_max_age_days(mut self, days: u64) -> Self {
        self.cookie_max_age = Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY));
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn auth_base_url(&self) -> &str {
        &self.auth_base_url
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Public page users end up on after logging out.
    #[must_use]
    pub fn landing_path(&self) -> &str {
        &self.landing_path
    }

    #[must_use]
    pub fn public_paths(&self) -> &[String] {
        &self.public_paths
    }

    #[must_use]
    pub fn exempt_prefixes(&self) -> &[String] {
        &self.exempt_prefixes
    }

    #[must_use]
    pub fn cookie_max_age(&self) -> Duration {
        self.cookie_max_age
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new()
    }
}
