//! Client-side session core: the record, its three storage surfaces, hydration
//! and the login/logout lifecycle.

pub mod backend;
pub mod error;
pub mod hydration;
pub mod lifecycle;
pub mod navigation;
pub mod persistor;
pub mod record;
pub mod storage;
pub mod store;

pub use backend::{AuthBackend, AuthResponse, Credentials, HttpAuthBackend, MockAuthBackend};
pub use error::{SessionError, StorageError};
pub use hydration::{HydrationCoordinator, HydrationSignal, HydrationState};
pub use lifecycle::SessionLifecycle;
pub use navigation::{HistoryNavigator, NavigationMode, Navigator};
pub use persistor::{DurablePersistor, MirrorRead};
pub use record::{Role, SessionRecord, SessionToken};
pub use storage::{CookieJar, KeyValueStore, RequestCookies, SetCookie};
pub use store::{SessionStore, Subscription};
