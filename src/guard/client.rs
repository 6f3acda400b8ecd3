//! Guard that runs inside a rendered protected section.

use super::policy::GuardPolicy;
use crate::session::{HydrationSignal, NavigationMode, Navigator, SessionStore};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientDecision {
    Render,
    /// Hydration has not resolved; show a neutral placeholder.
    Wait,
    Redirect(String),
}

#[derive(Clone, Debug)]
pub struct ClientRouteGuard {
    policy: GuardPolicy,
    store: SessionStore,
    signal: HydrationSignal,
}

impl ClientRouteGuard {
    #[must_use]
    pub fn new(policy: GuardPolicy, store: SessionStore, signal: HydrationSignal) -> Self {
        Self {
            policy,
            store,
            signal,
        }
    }

    /// Decide from the current state. An empty store is never taken as
    /// "logged out" until hydration has resolved.
    #[must_use]
    pub fn check(&self, path: &str) -> ClientDecision {
        let access = self.policy.requirement(path);
        if access.is_public() {
            return ClientDecision::Render;
        }
        if !self.signal.is_resolved() {
            return ClientDecision::Wait;
        }

        let session = self.store.get();
        if access.is_satisfied_by(session.as_ref()) {
            ClientDecision::Render
        } else {
            debug!(
                path,
                role = session.as_ref().map(|record| record.role().as_str()),
                "client guard redirect"
            );
            ClientDecision::Redirect(self.policy.login_path().to_string())
        }
    }

    /// Wait for hydration, then decide. Never returns [`ClientDecision::Wait`].
    pub async fn settle(&self, path: &str) -> ClientDecision {
        self.signal.wait_resolved().await;
        self.check(path)
    }

    /// Decide and, on a redirect, replace the current history entry.
    pub fn enforce(&self, path: &str, navigator: &dyn Navigator) -> ClientDecision {
        let decision = self.check(path);
        if let ClientDecision::Redirect(to) = &decision {
            navigator.navigate(to, NavigationMode::Replace);
        }
        decision
    }
}
