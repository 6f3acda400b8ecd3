//! Guard that runs before a page is delivered.
//!
//! Only the cookie mirror is visible here, so the edge proves that some session
//! exists and leaves role checks to the client guard.

use super::policy::GuardPolicy;
use crate::session::{persistor::COOKIE_TOKEN, RequestCookies, SessionToken};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeDecision {
    Allow,
    Redirect(String),
}

#[derive(Clone, Debug)]
pub struct EdgeRouteGuard {
    policy: GuardPolicy,
}

impl EdgeRouteGuard {
    #[must_use]
    pub fn new(policy: GuardPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    #[must_use]
    pub fn decide(&self, path: &str, cookies: &RequestCookies) -> EdgeDecision {
        if self.policy.requirement(path).is_public() {
            return EdgeDecision::Allow;
        }

        match cookies.get(COOKIE_TOKEN) {
            Some(token) if SessionToken::is_well_formed(token) => EdgeDecision::Allow,
            _ => EdgeDecision::Redirect(self.policy.login_path().to_string()),
        }
    }
}

/// axum middleware answering a denial with `307 Temporary Redirect`.
pub async fn edge_guard(
    State(guard): State<Arc<EdgeRouteGuard>>,
    request: Request,
    next: Next,
) -> Response {
    let cookies = RequestCookies::from_headers(request.headers());
    match guard.decide(request.uri().path(), &cookies) {
        EdgeDecision::Allow => next.run(request).await,
        EdgeDecision::Redirect(location) => {
            debug!(path = %request.uri().path(), %location, "edge guard redirect");
            Redirect::temporary(&location).into_response()
        }
    }
}
