use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// `PORTAL_LOG_LEVEL` names, indexed by the `-v` count they stand for.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Tracing level for a verbosity count. `None` keeps the ERROR default.
#[must_use]
pub const fn level(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

fn parse_level(raw: &str) -> Result<u8, String> {
    let raw = raw.trim().to_lowercase();
    LEVEL_NAMES
        .iter()
        .position(|name| *name == raw)
        .and_then(|index| u8::try_from(index).ok())
        .or_else(|| raw.parse::<u8>().ok().filter(|count| usize::from(*count) < LEVEL_NAMES.len()))
        .ok_or_else(|| format!("expected one of {} or 0-4", LEVEL_NAMES.join(", ")))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Raise log verbosity (-v warn .. -vvvv trace); PORTAL_LOG_LEVEL takes a level name")
            .env("PORTAL_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_level)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_and_counts() {
        assert_eq!(parse_level("error"), Ok(0));
        assert_eq!(parse_level(" Debug "), Ok(3));
        assert_eq!(parse_level("4"), Ok(4));
        assert!(parse_level("5").is_err());
        assert!(parse_level("verbose").is_err());
    }

    #[test]
    fn counts_map_to_levels() {
        assert_eq!(level(0), None);
        assert_eq!(level(1), Some(Level::WARN));
        assert_eq!(level(2), Some(Level::INFO));
        assert_eq!(level(3), Some(Level::DEBUG));
        assert_eq!(level(4), Some(Level::TRACE));
        assert_eq!(level(9), Some(Level::TRACE));
    }
}
