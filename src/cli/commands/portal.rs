use crate::config::DEFAULT_AUTH_BASE_URL;
use clap::{builder::ValueParser, Arg, Command};
use url::Url;

pub const ARG_AUTH_BASE_URL: &str = "auth-base-url";
pub const ARG_COOKIE_MAX_AGE_DAYS: &str = "cookie-max-age-days";

/// Only absolute http(s) addresses are accepted.
#[must_use]
pub fn validator_url() -> ValueParser {
    ValueParser::from(move |value: &str| -> std::result::Result<Url, String> {
        let url = Url::parse(value.trim()).map_err(|err| format!("invalid URL: {err}"))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(format!("unsupported URL scheme: {scheme}")),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_BASE_URL)
                .long(ARG_AUTH_BASE_URL)
                .help("Base URL of the auth API")
                .env("PORTAL_AUTH_BASE_URL")
                .default_value(DEFAULT_AUTH_BASE_URL)
                .value_parser(validator_url()),
        )
        .arg(
            Arg::new(ARG_COOKIE_MAX_AGE_DAYS)
                .long(ARG_COOKIE_MAX_AGE_DAYS)
                .help("Lifetime of the session cookies in days")
                .env("PORTAL_COOKIE_MAX_AGE_DAYS")
                .default_value("7")
                .value_parser(clap::value_parser!(u64).range(1..=365)),
        )
}
