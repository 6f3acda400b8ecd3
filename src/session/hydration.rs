//! Rebuilding the in-memory session from storage at the start of a page lifecycle.
//!
//! Guards must not treat an empty store as "logged out" until hydration has
//! resolved. [`HydrationSignal`] makes that explicit: it moves forward through
//! `Unresolved -> Settling -> Resolved` and can be awaited, so nothing depends on
//! a timer.

use super::{
    persistor::{DurablePersistor, MirrorRead},
    record::SessionRecord,
    store::SessionStore,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HydrationState {
    /// No hydration attempted yet.
    Unresolved,
    /// Storage is being read; an empty store is not authoritative.
    Settling,
    /// The store reflects storage; guards may decide.
    Resolved,
}

/// Shared, forward-only hydration progress.
#[derive(Clone, Debug)]
pub struct HydrationSignal {
    tx: Arc<watch::Sender<HydrationState>>,
}

impl HydrationSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(HydrationState::Unresolved);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn state(&self) -> HydrationState {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.state() == HydrationState::Resolved
    }

    /// Resolves once the state reaches [`HydrationState::Resolved`].
    pub async fn wait_resolved(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|state| *state == HydrationState::Resolved).await;
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HydrationState> {
        self.tx.subscribe()
    }

    /// Move to `next` if it is ahead of the current state.
    fn advance(&self, next: HydrationState) -> bool {
        self.tx.send_if_modified(|state| {
            if next > *state {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    fn reset(&self) {
        self.tx.send_replace(HydrationState::Unresolved);
    }
}

impl Default for HydrationSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct HydrationCoordinator {
    persistor: Arc<DurablePersistor>,
    store: SessionStore,
    signal: HydrationSignal,
}

impl HydrationCoordinator {
    #[must_use]
    pub fn new(persistor: Arc<DurablePersistor>, store: SessionStore, signal: HydrationSignal) -> Self {
        Self {
            persistor,
            store,
            signal,
        }
    }

    #[must_use]
    pub fn signal(&self) -> &HydrationSignal {
        &self.signal
    }

    /// Populate the store from storage. Runs once per lifecycle; later calls
    /// return the current store contents without touching storage.
    pub fn hydrate(&self) -> Option<SessionRecord> {
        if !self.signal.advance(HydrationState::Settling) {
            debug!("Hydration already ran for this lifecycle");
            return self.store.get();
        }

        let record = match self.persistor.read_mirror() {
            MirrorRead::Durable(record) => {
                self.store.set(record.clone());
                Some(record)
            }
            MirrorRead::CookieFallback(record) => {
                self.store.set(record.clone());
                // Restore the durable copy from the cookie mirror.
                if let Err(err) = self.persistor.write(&record) {
                    warn!("Failed to repair durable session from cookie mirror: {err}");
                }
                Some(record)
            }
            MirrorRead::Absent => {
                self.store.clear();
                None
            }
        };

        self.signal.advance(HydrationState::Resolved);
        info!(
            authenticated = record.is_some(),
            role = record.as_ref().map(|r| r.role().as_str()),
            "Session hydrated"
        );
        record
    }

    /// Start a fresh lifecycle after logout; the next [`hydrate`](Self::hydrate)
    /// reads storage again.
    pub fn reinitialize(&self) {
        debug!("Hydration reinitialized");
        self.signal.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        persistor::{DURABLE_SESSION_KEY, DURABLE_TOKEN_KEY},
        record::{Role, SessionToken},
        storage::{KeyValueStore, MemoryCookieJar, MemoryStore},
    };
    use std::{
        sync::{Mutex, PoisonError},
        time::Duration,
    };

    struct Fixture {
        durable: Arc<MemoryStore>,
        persistor: Arc<DurablePersistor>,
        store: SessionStore,
        coordinator: HydrationCoordinator,
    }

    fn fixture() -> Fixture {
        let durable = Arc::new(MemoryStore::new());
        let cookies = Arc::new(MemoryCookieJar::new());
        let persistor = Arc::new(DurablePersistor::new(
            durable.clone(),
            cookies,
            Duration::from_secs(3600),
        ));
        let store = SessionStore::new();
        let coordinator =
            HydrationCoordinator::new(persistor.clone(), store.clone(), HydrationSignal::new());
        Fixture {
            durable,
            persistor,
            store,
            coordinator,
        }
    }

    fn record() -> SessionRecord {
        let token = SessionToken::parse("mock-token-7").unwrap_or_else(|err| panic!("{err}"));
        SessionRecord::new("1", "Juan Pérez", "cliente@correo.com", Role::Customer, token)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    #[test]
    fn signal_only_moves_forward() {
        let signal = HydrationSignal::new();
        assert_eq!(signal.state(), HydrationState::Unresolved);
        assert!(signal.advance(HydrationState::Resolved));
        assert!(!signal.advance(HydrationState::Settling));
        assert_eq!(signal.state(), HydrationState::Resolved);
        signal.reset();
        assert_eq!(signal.state(), HydrationState::Unresolved);
    }

    #[test]
    fn hydrate_populates_store_and_resolves() {
        let f = fixture();
        let _ = f.persistor.write(&record());

        assert_eq!(f.coordinator.hydrate(), Some(record()));
        assert_eq!(f.store.get(), Some(record()));
        assert!(f.coordinator.signal().is_resolved());
    }

    #[test]
    fn hydrate_without_session_clears_and_resolves() {
        let f = fixture();
        assert_eq!(f.coordinator.hydrate(), None);
        assert!(f.store.get().is_none());
        assert!(f.coordinator.signal().is_resolved());
    }

    #[test]
    fn store_notification_happens_while_settling() {
        let f = fixture();
        let _ = f.persistor.write(&record());
        let signal = f.coordinator.signal().clone();
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let _sub = f.store.subscribe(move |_| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(signal.state());
        });

        f.coordinator.hydrate();

        assert_eq!(
            *observed.lock().unwrap_or_else(PoisonError::into_inner),
            vec![HydrationState::Settling]
        );
    }

    #[test]
    fn hydrate_over_disabled_storage_resolves_empty() {
        use crate::{
            config::PortalConfig,
            guard::{ClientDecision, ClientRouteGuard, GuardPolicy},
            session::storage::DisabledStorage,
        };

        let persistor = Arc::new(DurablePersistor::new(
            Arc::new(DisabledStorage),
            Arc::new(DisabledStorage),
            Duration::from_secs(3600),
        ));
        let store = SessionStore::new();
        let signal = HydrationSignal::new();
        let coordinator = HydrationCoordinator::new(persistor, store.clone(), signal.clone());
        let guard = ClientRouteGuard::new(GuardPolicy::new(&PortalConfig::default()), store, signal);

        assert_eq!(coordinator.hydrate(), None);
        assert!(coordinator.signal().is_resolved());
        assert_eq!(
            guard.check("/cliente/bienvenida"),
            ClientDecision::Redirect("/login".to_string())
        );
        assert_eq!(guard.check("/"), ClientDecision::Render);
    }

    #[test]
    fn hydrate_runs_once_per_lifecycle() {
        let f = fixture();
        assert_eq!(f.coordinator.hydrate(), None);

        let _ = f.persistor.write(&record());
        assert_eq!(f.coordinator.hydrate(), None, "second call must not reread storage");

        f.coordinator.reinitialize();
        assert_eq!(f.coordinator.signal().state(), HydrationState::Unresolved);
        assert_eq!(f.coordinator.hydrate(), Some(record()));
    }

    #[test]
    fn cookie_fallback_repairs_durable_copy() {
        let f = fixture();
        let _ = f.persistor.write(&record());
        let _ = f.durable.remove(DURABLE_SESSION_KEY);
        let _ = f.durable.remove(DURABLE_TOKEN_KEY);

        assert_eq!(f.coordinator.hydrate(), Some(record()));
        assert!(f.durable.get(DURABLE_SESSION_KEY).is_ok_and(|v| v.is_some()));
        assert_eq!(
            f.durable.get(DURABLE_TOKEN_KEY),
            Ok(Some("mock-token-7".to_string()))
        );
    }

    #[tokio::test]
    async fn wait_resolved_completes_after_hydration() {
        let f = fixture();
        let signal = f.coordinator.signal().clone();
        let waiter = tokio::spawn(async move { signal.wait_resolved().await });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        f.coordinator.hydrate();
        let joined = tokio::time::timeout(Duration::from_secs(1), waiter).await;
        assert!(joined.is_ok_and(|result| result.is_ok()));
    }
}
