//! # ecportal (Electrocentro portal sessions)
//!
//! `ecportal` keeps a single "who is logged in" fact consistent across three
//! storage surfaces and uses it to gate the customer and administrator sections
//! of the portal.
//!
//! ## Surfaces
//!
//! - **Session store:** the in-memory owner of the live [`session::SessionRecord`].
//!   Everything the UI reads comes from here.
//! - **Durable store:** long-lived client key/value storage that survives reloads.
//! - **Cookie mirror:** the subset of the session sent with every request, the
//!   only surface the edge guard can see.
//!
//! ## Guards
//!
//! Both guards share one [`guard::GuardPolicy`], so they cannot disagree on what a
//! path requires:
//!
//! - The **edge guard** runs before a page is delivered and only proves that *some*
//!   session exists (a well-formed token in the cookie mirror).
//! - The **client guard** runs after hydration and proves that the *right* session
//!   exists (role checks). It answers `Wait` until hydration resolves, so a valid
//!   session is never denied while it is still being read back.
//!
//! ## Roles
//!
//! Administrators may open customer-scoped pages; customers may not open
//! administrator-scoped pages.

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod guard;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
