use crate::cli::{
    actions::{server::Args, Action},
    commands::{portal, ARG_PORT},
};
use anyhow::{Context, Result};
use url::Url;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let auth_base_url = matches
        .get_one::<Url>(portal::ARG_AUTH_BASE_URL)
        .cloned()
        .context("missing required argument: --auth-base-url")?;
    let cookie_max_age_days = matches
        .get_one::<u64>(portal::ARG_COOKIE_MAX_AGE_DAYS)
        .copied()
        .context("missing required argument: --cookie-max-age-days")?;

    Ok(Action::Server(Args {
        port,
        auth_base_url,
        cookie_max_age_days,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn builds_server_action() {
        temp_env::with_vars(
            [
                ("PORTAL_PORT", None::<&str>),
                ("PORTAL_AUTH_BASE_URL", None),
                ("PORTAL_COOKIE_MAX_AGE_DAYS", None),
            ],
            || {
                let matches = commands::new().get_matches_from(vec!["ecportal", "-p", "3000"]);
                let action = handler(&matches).unwrap_or_else(|err| panic!("{err}"));
                let Action::Server(args) = action;
                assert_eq!(args.port, 3000);
                assert_eq!(args.auth_base_url.as_str(), "https://api.electrocentro.fake/v1");
                assert_eq!(args.cookie_max_age_days, 7);
            },
        );
    }
}
