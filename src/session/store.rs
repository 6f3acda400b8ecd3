//! In-memory owner of the live session.
//!
//! The store is a clonable handle; every clone sees the same state. Mutations are
//! synchronous and deliver notifications to every current subscriber, in
//! subscription order, before returning. Listeners run outside the internal locks,
//! so they are free to read the store (or a guard built on it).

use super::record::SessionRecord;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

/// Callback invoked with the new session state after each mutation.
pub type Listener = Arc<dyn Fn(Option<&SessionRecord>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    current: RwLock<Option<SessionRecord>>,
    listeners: Mutex<Listeners>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session, if any.
    #[must_use]
    pub fn get(&self) -> Option<SessionRecord> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Replace the current session and notify subscribers.
    pub fn set(&self, record: SessionRecord) {
        self.replace(Some(record));
    }

    /// Drop the current session and notify subscribers.
    pub fn clear(&self) {
        self.replace(None);
    }

    /// Register a listener. It stays registered until [`Subscription::unsubscribe`].
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&SessionRecord>) + Send + Sync + 'static,
    {
        let mut listeners = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    fn replace(&self, next: Option<SessionRecord>) {
        {
            let mut current = self
                .inner
                .current
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            current.clone_from(&next);
        }

        // Snapshot so listeners may subscribe, unsubscribe or read without deadlocking.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(next.as_ref());
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    store: Weak<Inner>,
    id: u64,
}

impl Subscription {
    /// Stop receiving notifications. A no-op if the store is gone.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entries
                .retain(|(id, _)| *id != self.id);
        }
    }
}
