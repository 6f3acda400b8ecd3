//! Login and logout across every session surface.

use super::{
    backend::{AuthBackend, Credentials},
    error::SessionError,
    navigation::{NavigationMode, Navigator},
    persistor::DurablePersistor,
    record::{SessionRecord, SessionToken},
    store::SessionStore,
};
use std::{future::Future, sync::Arc};
use tracing::{debug, info, warn};

pub struct SessionLifecycle<B> {
    backend: B,
    store: SessionStore,
    persistor: Arc<DurablePersistor>,
    navigator: Arc<dyn Navigator>,
    landing_path: String,
    login_path: String,
}

impl<B: AuthBackend> SessionLifecycle<B> {
    #[must_use]
    pub fn new(
        backend: B,
        store: SessionStore,
        persistor: Arc<DurablePersistor>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            backend,
            store,
            persistor,
            navigator,
            landing_path: "/".to_string(),
            login_path: "/login".to_string(),
        }
    }

    #[must_use]
    pub fn with_landing_path(mut self, path: &str) -> Self {
        self.landing_path = path.to_string();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: &str) -> Self {
        self.login_path = path.to_string();
        self
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Authenticate and publish the session to the store, then storage, then
    /// navigate to the role's landing page.
    ///
    /// Nothing is mutated unless the backend accepts the credentials. A storage
    /// failure after acceptance leaves a memory-only session for this lifecycle.
    ///
    /// # Errors
    /// Form validation errors, [`SessionError::CredentialsInvalid`] or
    /// [`SessionError::BackendUnavailable`].
    pub async fn login(&self, credentials: Credentials) -> Result<SessionRecord, SessionError> {
        credentials.validate()?;

        let response = self.backend.login(&credentials).await.map_err(|err| {
            debug!("Login rejected: {err}");
            err
        })?;
        let record = response.into_record()?;

        self.store.set(record.clone());
        if let Err(err) = self.persistor.write(&record) {
            warn!("Session kept in memory only: {err}");
        }

        info!(user_id = %record.user_id(), role = %record.role(), "Logged in");
        self.navigator
            .navigate(record.role().landing_path(), NavigationMode::Push);
        Ok(record)
    }

    /// Clear every surface and return to the public landing page with a fresh
    /// history. Safe to call without a session.
    pub async fn logout(&self) {
        let previous = self.store.get();
        self.clear_all();
        self.navigator
            .navigate(&self.landing_path, NavigationMode::Reset);

        if let Some(record) = previous {
            info!(user_id = %record.user_id(), "Logged out");
            if let Err(err) = self.backend.logout(record.token()).await {
                debug!("Ignoring auth backend logout failure: {err}");
            }
        }
    }

    /// Run an authenticated call with the current session's token.
    ///
    /// A missing session or a [`SessionError::TokenRejected`] answer ends the
    /// session through [`expire`](Self::expire).
    ///
    /// # Errors
    /// Whatever `call` returns, or [`SessionError::TokenRejected`] without a session.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, SessionError>
    where
        F: FnOnce(SessionToken) -> Fut,
        Fut: Future<Output = Result<T, SessionError>>,
    {
        let Some(record) = self.store.get() else {
            self.expire();
            return Err(SessionError::TokenRejected);
        };

        let result = call(record.token().clone()).await;
        if matches!(result, Err(SessionError::TokenRejected)) {
            self.expire();
        }
        result
    }

    /// The backend reported the token as no longer valid: drop the session and
    /// send the user to the login page without a way back.
    pub fn expire(&self) {
        warn!("Session rejected by auth backend, clearing");
        self.clear_all();
        self.navigator
            .navigate(&self.login_path, NavigationMode::Replace);
    }

    fn clear_all(&self) {
        self.store.clear();
        if let Err(err) = self.persistor.clear() {
            warn!("Session storage only partially cleared: {err}");
        }
    }
}

impl<B> std::fmt::Debug for SessionLifecycle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("store", &self.store)
            .field("landing_path", &self.landing_path)
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}
