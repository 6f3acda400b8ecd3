//! Mirror of the session in durable storage and in cookies.
//!
//! The persistor owns no state. It only knows the fixed keys and the order in which
//! the two locations are touched:
//!
//! - **write:** cookie first (the only copy the edge guard can see), then durable.
//! - **clear:** cookie first, then durable; every key is attempted even after a
//!   failure so one location is never left populated because the other failed.
//! - **read:** durable first, cookie as fallback. If neither yields a complete,
//!   consistent record, every key is purged and the session reads as absent.

use super::{
    error::{SessionError, StorageError},
    record::SessionRecord,
    storage::{CookieJar, KeyValueStore, SetCookie},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

pub const DURABLE_SESSION_KEY: &str = "ec_user";
pub const DURABLE_TOKEN_KEY: &str = "ec_token";
pub const COOKIE_TOKEN: &str = "ec_token";
pub const COOKIE_SESSION: &str = "ec_user";
pub const COOKIE_ROLE: &str = "user_role";

const DURABLE_KEYS: [&str; 2] = [DURABLE_SESSION_KEY, DURABLE_TOKEN_KEY];
const COOKIE_NAMES: [&str; 3] = [COOKIE_TOKEN, COOKIE_SESSION, COOKIE_ROLE];

/// Where a read found the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MirrorRead {
    Durable(SessionRecord),
    CookieFallback(SessionRecord),
    Absent,
}

impl MirrorRead {
    #[must_use]
    pub fn into_record(self) -> Option<SessionRecord> {
        match self {
            Self::Durable(record) | Self::CookieFallback(record) => Some(record),
            Self::Absent => None,
        }
    }
}

pub struct DurablePersistor {
    durable: Arc<dyn KeyValueStore>,
    cookies: Arc<dyn CookieJar>,
    cookie_max_age: Duration,
}

impl DurablePersistor {
    #[must_use]
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        cookies: Arc<dyn CookieJar>,
        cookie_max_age: Duration,
    ) -> Self {
        Self {
            durable,
            cookies,
            cookie_max_age,
        }
    }

    /// Write the record to both locations. Safe to repeat.
    ///
    /// # Errors
    /// Returns [`SessionError::StorageUnavailable`] for the first location that
    /// failed. The other location is still written.
    pub fn write(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let json = record.to_mirror_json()?;
        let token = record.token().expose();

        let cookie_result = self.write_cookies(record, &json, token);
        if let Err(err) = &cookie_result {
            warn!("Failed to write session cookies: {err}");
        }

        let durable_result = self
            .durable
            .set(DURABLE_SESSION_KEY, &json)
            .and_then(|()| self.durable.set(DURABLE_TOKEN_KEY, token));
        if let Err(err) = &durable_result {
            warn!("Failed to write durable session: {err}");
        }

        cookie_result.and(durable_result).map_err(SessionError::from)
    }

    /// Read the session back, purging everything if no location is usable.
    #[must_use]
    pub fn read(&self) -> Option<SessionRecord> {
        self.read_mirror().into_record()
    }

    /// Like [`read`](Self::read), but reports which location answered.
    #[must_use]
    pub fn read_mirror(&self) -> MirrorRead {
        match self.read_durable() {
            Ok(Some(record)) => return MirrorRead::Durable(record),
            Ok(None) => debug!("No durable session, trying cookie mirror"),
            Err(err) => warn!("Durable session unusable, trying cookie mirror: {err}"),
        }

        match self.read_cookies() {
            Ok(Some(record)) => return MirrorRead::CookieFallback(record),
            Ok(None) => debug!("No session in cookie mirror"),
            Err(err) => warn!("Cookie session unusable: {err}"),
        }

        if let Err(err) = self.clear() {
            warn!("Failed to purge session storage: {err}");
        }
        MirrorRead::Absent
    }

    /// Remove every key in both locations.
    ///
    /// # Errors
    /// Returns [`SessionError::StorageUnavailable`] for the first failed removal;
    /// the remaining keys are still attempted.
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut first_error: Option<StorageError> = None;

        for name in COOKIE_NAMES {
            if let Err(err) = self.cookies.set(SetCookie::expired(name)) {
                first_error.get_or_insert(err);
            }
        }
        for key in DURABLE_KEYS {
            if let Err(err) = self.durable.remove(key) {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn write_cookies(
        &self,
        record: &SessionRecord,
        json: &str,
        token: &str,
    ) -> Result<(), StorageError> {
        let encoded = URL_SAFE_NO_PAD.encode(json.as_bytes());
        self.cookies
            .set(SetCookie::new(COOKIE_TOKEN, token, self.cookie_max_age))?;
        self.cookies.set(SetCookie::new(
            COOKIE_ROLE,
            record.role().as_str(),
            self.cookie_max_age,
        ))?;
        self.cookies
            .set(SetCookie::new(COOKIE_SESSION, &encoded, self.cookie_max_age))
    }

    /// `Ok(None)` when nothing is stored; `Err` when something is stored but unusable.
    fn read_durable(&self) -> Result<Option<SessionRecord>, SessionError> {
        let session = self.durable.get(DURABLE_SESSION_KEY)?;
        let token = self.durable.get(DURABLE_TOKEN_KEY)?;

        match (session, token) {
            (None, None) => Ok(None),
            (Some(json), Some(token)) => {
                let record = SessionRecord::from_mirror_json(&json)?;
                if record.token().expose() == token {
                    Ok(Some(record))
                } else {
                    Err(SessionError::SessionCorrupt(
                        "durable token does not match session".to_string(),
                    ))
                }
            }
            _ => Err(SessionError::SessionCorrupt(
                "durable session is partially written".to_string(),
            )),
        }
    }

    fn read_cookies(&self) -> Result<Option<SessionRecord>, SessionError> {
        let session = self.cookies.get(COOKIE_SESSION)?;
        let token = self.cookies.get(COOKIE_TOKEN)?;
        let role = self.cookies.get(COOKIE_ROLE)?;

        match (session, token, role) {
            (None, None, None) => Ok(None),
            (Some(encoded), Some(token), Some(role)) => {
                let bytes = URL_SAFE_NO_PAD
                    .decode(encoded.as_bytes())
                    .map_err(|err| SessionError::SessionCorrupt(err.to_string()))?;
                let json = String::from_utf8(bytes)
                    .map_err(|err| SessionError::SessionCorrupt(err.to_string()))?;
                let record = SessionRecord::from_mirror_json(&json)?;

                if record.token().expose() != token {
                    return Err(SessionError::SessionCorrupt(
                        "cookie token does not match session".to_string(),
                    ));
                }
                if record.role().as_str() != role {
                    return Err(SessionError::SessionCorrupt(
                        "cookie role does not match session".to_string(),
                    ));
                }
                Ok(Some(record))
            }
            _ => Err(SessionError::SessionCorrupt(
                "cookie mirror is partially written".to_string(),
            )),
        }
    }
}

impl std::fmt::Debug for DurablePersistor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurablePersistor")
            .field("cookie_max_age", &self.cookie_max_age)
            .finish_non_exhaustive()
    }
}
