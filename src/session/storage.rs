//! Storage capabilities behind the persistor.
//!
//! Two surfaces exist: a durable key/value store that survives reloads and a
//! cookie jar whose contents travel with every request. Both are synchronous,
//! like the browser APIs they stand for. The in-memory implementations double as
//! test fixtures; [`JsonFileStore`] gives long-running clients a durable store.

use super::error::StorageError;
use axum::http::{header::COOKIE, HeaderMap};
use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
    time::Duration,
};

const EPOCH_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Long-lived client key/value storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Client-side view of the cookie mirror.
pub trait CookieJar: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, cookie: SetCookie) -> Result<(), StorageError>;
}

/// One cookie write, application-wide (`Path=/`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: String,
    max_age: Duration,
}

impl SetCookie {
    #[must_use]
    pub fn new(name: &str, value: &str, max_age: Duration) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            max_age,
        }
    }

    /// A write that deletes `name` by giving it an already-expired date.
    #[must_use]
    pub fn expired(name: &str) -> Self {
        Self::new(name, "", Duration::ZERO)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.max_age.is_zero()
    }

    /// Render as a `Set-Cookie` / `document.cookie` value.
    #[must_use]
    pub fn header_value(&self) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; SameSite=Lax; Max-Age={}",
            self.name,
            self.value,
            self.max_age.as_secs()
        );
        if self.is_expired() {
            cookie.push_str("; Expires=");
            cookie.push_str(EPOCH_EXPIRES);
        }
        cookie
    }
}

/// Read-only cookies parsed from a request's `Cookie` header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestCookies {
    pairs: Vec<(String, String)>,
}

impl RequestCookies {
    /// Parse a `Cookie` header value. Malformed pairs are skipped.
    #[must_use]
    pub fn parse(header: &str) -> Self {
        let pairs = header
            .split(';')
            .filter_map(|pair| {
                let mut parts = pair.trim().splitn(2, '=');
                let key = parts.next()?.trim();
                let value = parts.next()?.trim();
                if key.is_empty() {
                    None
                } else {
                    Some((key.to_string(), value.to_string()))
                }
            })
            .collect();
        Self { pairs }
    }

    /// Collect every `Cookie` header of a request.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Self::parse(value).pairs)
            .collect();
        Self { pairs }
    }

    /// First value sent for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Process-local durable store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

/// Durable store kept as a JSON object in a single file.
///
/// Writes go to a sibling temp file first and are then renamed over the target,
/// so a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| StorageError::Format(err.to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(StorageError::Io(err.to_string())),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json =
            serde_json::to_string_pretty(entries).map_err(|err| StorageError::Io(err.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|err| StorageError::Io(err.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|err| StorageError::Io(err.to_string()))
    }

    /// Apply `change` to the stored map. An unreadable file is replaced.
    fn update<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(StorageError::Format(_)) => BTreeMap::new(),
            Err(err) => return Err(err),
        };
        change(&mut entries);
        self.save(&entries)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// In-memory cookie jar that also keeps every write it received.
#[derive(Debug, Default)]
pub struct MemoryCookieJar {
    state: Mutex<JarState>,
}

#[derive(Debug, Default)]
struct JarState {
    live: BTreeMap<String, String>,
    writes: Vec<SetCookie>,
}

impl MemoryCookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The `Cookie` header a browser holding this jar would send.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.live.is_empty() {
            return None;
        }
        Some(
            state
                .live
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Most recent write for `name`, including deletions.
    #[must_use]
    pub fn last_write(&self, name: &str) -> Option<SetCookie> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .writes
            .iter()
            .rev()
            .find(|cookie| cookie.name() == name)
            .cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .is_empty()
    }
}

impl CookieJar for MemoryCookieJar {
    fn get(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .live
            .get(name)
            .cloned())
    }

    fn set(&self, cookie: SetCookie) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if cookie.is_expired() {
            state.live.remove(cookie.name());
        } else {
            state
                .live
                .insert(cookie.name().to_string(), cookie.value().to_string());
        }
        state.writes.push(cookie);
        Ok(())
    }
}

/// Storage that refuses every operation, as with disabled browser storage.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledStorage;

impl KeyValueStore for DisabledStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Disabled)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Disabled)
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Disabled)
    }
}

impl CookieJar for DisabledStorage {
    fn get(&self, _name: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Disabled)
    }

    fn set(&self, _cookie: SetCookie) -> Result<(), StorageError> {
        Err(StorageError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use ulid::Ulid;

    #[test]
    fn set_cookie_header_value() {
        let cookie = SetCookie::new("ec_token", "abc", Duration::from_secs(604_800));
        assert_eq!(
            cookie.header_value(),
            "ec_token=abc; Path=/; SameSite=Lax; Max-Age=604800"
        );
        assert!(!cookie.is_expired());
    }

    #[test]
    fn expired_cookie_carries_epoch_date() {
        let cookie = SetCookie::expired("user_role");
        assert!(cookie.is_expired());
        assert_eq!(
            cookie.header_value(),
            "user_role=; Path=/; SameSite=Lax; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }

    #[test]
    fn request_cookies_parse_and_first_wins() {
        let cookies = RequestCookies::parse("a=1; ec_token=abc ; broken; =x; ec_token=zzz");
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("ec_token"), Some("abc"));
        assert_eq!(cookies.get("broken"), None);
        assert_eq!(cookies.get("missing"), None);
    }

    #[test]
    fn request_cookies_from_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("ec_token=abc"));
        let cookies = RequestCookies::from_headers(&headers);
        assert_eq!(cookies.get("a"), Some("1"));
        assert_eq!(cookies.get("ec_token"), Some("abc"));
    }

    #[test]
    fn memory_cookie_jar_tracks_live_and_writes() {
        let jar = MemoryCookieJar::new();
        assert_eq!(jar.cookie_header(), None);

        let _ = jar.set(SetCookie::new("b", "2", Duration::from_secs(60)));
        let _ = jar.set(SetCookie::new("a", "1", Duration::from_secs(60)));
        assert_eq!(jar.cookie_header().as_deref(), Some("a=1; b=2"));

        let _ = jar.set(SetCookie::expired("a"));
        assert_eq!(jar.get("a"), Ok(None));
        assert_eq!(jar.cookie_header().as_deref(), Some("b=2"));
        assert!(jar.last_write("a").is_some_and(|cookie| cookie.is_expired()));
    }

    #[test]
    fn disabled_storage_refuses_everything() {
        let storage = DisabledStorage;
        assert_eq!(KeyValueStore::get(&storage, "k"), Err(StorageError::Disabled));
        assert_eq!(
            CookieJar::set(&storage, SetCookie::expired("k")),
            Err(StorageError::Disabled)
        );
    }

    #[test]
    fn json_file_store_persists_across_instances() {
        let path = std::env::temp_dir().join(format!("ecportal-store-{}.json", Ulid::new()));
        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("ec_token"), Ok(None));
        assert_eq!(store.set("ec_token", "abc"), Ok(()));

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("ec_token"), Ok(Some("abc".to_string())));
        assert_eq!(reopened.remove("ec_token"), Ok(()));
        assert_eq!(store.get("ec_token"), Ok(None));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn json_file_store_reports_and_replaces_garbage() {
        let path = std::env::temp_dir().join(format!("ecportal-store-{}.json", Ulid::new()));
        let _ = fs::write(&path, "{{ not json");
        let store = JsonFileStore::new(&path);
        assert!(matches!(store.get("k"), Err(StorageError::Format(_))));

        assert_eq!(store.remove("k"), Ok(()));
        assert_eq!(store.get("k"), Ok(None));

        let _ = fs::remove_file(&path);
    }
}
