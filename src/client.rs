//! One explicitly constructed set of client-side session components.
//!
//! Every collaborator is injected, so tests and embedders can build as many
//! independent portals as they need.

use crate::{
    config::PortalConfig,
    guard::{ClientDecision, ClientRouteGuard, GuardPolicy},
    session::{
        AuthBackend, CookieJar, Credentials, DurablePersistor, HydrationCoordinator,
        HydrationSignal, HydrationState, KeyValueStore, Navigator, SessionError, SessionLifecycle,
        SessionRecord, SessionStore, SessionToken,
    },
};
use std::{future::Future, sync::Arc};

pub struct PortalClient<B> {
    store: SessionStore,
    persistor: Arc<DurablePersistor>,
    hydration: HydrationCoordinator,
    guard: ClientRouteGuard,
    lifecycle: SessionLifecycle<B>,
    navigator: Arc<dyn Navigator>,
}

impl<B: AuthBackend> PortalClient<B> {
    #[must_use]
    pub fn new(
        config: &PortalConfig,
        backend: B,
        durable: Arc<dyn KeyValueStore>,
        cookies: Arc<dyn CookieJar>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let store = SessionStore::new();
        let signal = HydrationSignal::new();
        let persistor = Arc::new(DurablePersistor::new(
            durable,
            cookies,
            config.cookie_max_age(),
        ));
        let hydration = HydrationCoordinator::new(persistor.clone(), store.clone(), signal.clone());
        let guard = ClientRouteGuard::new(GuardPolicy::new(config), store.clone(), signal);
        let lifecycle = SessionLifecycle::new(
            backend,
            store.clone(),
            persistor.clone(),
            navigator.clone(),
        )
        .with_landing_path(config.landing_path())
        .with_login_path(config.login_path());

        Self {
            store,
            persistor,
            hydration,
            guard,
            lifecycle,
            navigator,
        }
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    #[must_use]
    pub fn persistor(&self) -> &DurablePersistor {
        &self.persistor
    }

    #[must_use]
    pub fn signal(&self) -> &HydrationSignal {
        self.hydration.signal()
    }

    #[must_use]
    pub fn guard(&self) -> &ClientRouteGuard {
        &self.guard
    }

    #[must_use]
    pub fn lifecycle(&self) -> &SessionLifecycle<B> {
        &self.lifecycle
    }

    /// Start of a page lifecycle.
    pub fn hydrate(&self) -> Option<SessionRecord> {
        self.hydration.hydrate()
    }

    /// # Errors
    /// See [`SessionLifecycle::login`].
    pub async fn login(&self, credentials: Credentials) -> Result<SessionRecord, SessionError> {
        self.lifecycle.login(credentials).await
    }

    /// Log out and start the fresh page lifecycle the landing page would get.
    pub async fn logout(&self) {
        self.lifecycle.logout().await;
        self.hydration.reinitialize();
        self.hydration.hydrate();
    }

    /// # Errors
    /// See [`SessionLifecycle::authorized`].
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, SessionError>
    where
        F: FnOnce(SessionToken) -> Fut,
        Fut: Future<Output = Result<T, SessionError>>,
    {
        self.lifecycle.authorized(call).await
    }

    /// Guard decision for the current state, navigating away on a redirect.
    pub fn visit(&self, path: &str) -> ClientDecision {
        self.guard.enforce(path, self.navigator.as_ref())
    }

    /// Like [`visit`](Self::visit), but waits for hydration first, starting it
    /// if this lifecycle has not hydrated yet.
    pub async fn open(&self, path: &str) -> ClientDecision {
        if self.signal().state() == HydrationState::Unresolved {
            self.hydrate();
        }
        self.signal().wait_resolved().await;
        self.visit(path)
    }
}

impl<B> std::fmt::Debug for PortalClient<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("store", &self.store)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        storage::{MemoryCookieJar, MemoryStore},
        HistoryNavigator, MockAuthBackend, Role,
    };

    fn client() -> (PortalClient<MockAuthBackend>, Arc<HistoryNavigator>) {
        let navigator = Arc::new(HistoryNavigator::new("/login"));
        let client = PortalClient::new(
            &PortalConfig::default(),
            MockAuthBackend::new(),
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryCookieJar::new()),
            navigator.clone(),
        );
        (client, navigator)
    }

    #[test]
    fn clients_are_independent() {
        let (first, _) = client();
        let (second, _) = client();
        first.hydrate();

        assert!(first.signal().is_resolved());
        assert!(!second.signal().is_resolved());
    }

    #[tokio::test]
    async fn login_then_visit_landing_page() {
        let (client, navigator) = client();
        client.hydrate();

        let record = client
            .login(Credentials::new("cliente@correo.com", "1234"))
            .await
            .unwrap_or_else(|err| panic!("{err}"));

        assert_eq!(record.role(), Role::Customer);
        assert_eq!(client.visit("/cliente/bienvenida"), ClientDecision::Render);
        assert_eq!(
            navigator.current().as_deref(),
            Some("/cliente/bienvenida")
        );
    }

    #[tokio::test]
    async fn logout_leaves_a_resolved_empty_lifecycle() {
        let (client, navigator) = client();
        client.hydrate();
        let _ = client
            .login(Credentials::new("admin@correo.com", "1234"))
            .await;

        client.logout().await;

        assert!(client.signal().is_resolved());
        assert!(client.store().get().is_none());
        assert_eq!(
            client.visit("/admin/bienvenida"),
            ClientDecision::Redirect("/login".to_string())
        );
        assert_eq!(navigator.entries(), vec!["/login"]);
    }

    #[tokio::test]
    async fn rejected_token_clears_and_returns_to_login() {
        let (client, navigator) = client();
        client.hydrate();
        let _ = client
            .login(Credentials::new("cliente@correo.com", "1234"))
            .await;

        let result: Result<(), SessionError> = client
            .authorized(|_| async { Err(SessionError::TokenRejected) })
            .await;

        assert_eq!(result, Err(SessionError::TokenRejected));
        assert!(client.persistor().read().is_none());
        assert_eq!(navigator.current().as_deref(), Some("/login"));
    }

    #[tokio::test]
    async fn open_hydrates_a_fresh_lifecycle() {
        let (client, navigator) = client();

        let decision = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            client.open("/cliente/bienvenida"),
        )
        .await;

        assert_eq!(decision.ok(), Some(ClientDecision::Redirect("/login".to_string())));
        assert!(client.signal().is_resolved());
        assert_eq!(navigator.entries(), vec!["/login"]);
    }
}
