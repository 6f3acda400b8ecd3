//! The canonical session shape and its persisted projection.
//!
//! A [`SessionRecord`] can only be built through validating constructors, so a
//! value of that type is always complete. The persisted projection is parsed with a
//! strict schema; any mismatch is reported as [`SessionError::SessionCorrupt`].

use super::error::SessionError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

const MAX_TOKEN_LEN: usize = 512;

/// Closed set of portal roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    #[serde(rename = "cliente", alias = "customer")]
    Customer,
    #[serde(rename = "admin", alias = "administrator")]
    Administrator,
}

impl Role {
    /// Wire name used in cookies and persisted records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "cliente",
            Self::Administrator => "admin",
        }
    }

    /// Whether a session with this role may open a section scoped to `required`.
    ///
    /// Administrators are a superset of customers; the reverse does not hold.
    #[must_use]
    pub const fn satisfies(self, required: Role) -> bool {
        match (self, required) {
            (Self::Administrator, _) | (Self::Customer, Self::Customer) => true,
            (Self::Customer, Self::Administrator) => false,
        }
    }

    /// Page a freshly logged-in user lands on.
    #[must_use]
    pub const fn landing_path(self) -> &'static str {
        match self {
            Self::Customer => "/cliente/bienvenida",
            Self::Administrator => "/admin/bienvenida",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = SessionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "cliente" | "customer" => Ok(Self::Customer),
            "admin" | "administrator" => Ok(Self::Administrator),
            other => Err(SessionError::SessionCorrupt(format!("unknown role: {other}"))),
        }
    }
}

/// Opaque bearer credential. Only the auth backend understands its contents.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

impl SessionToken {
    /// Validate and wrap a raw token.
    ///
    /// # Errors
    /// Returns [`SessionError::SessionCorrupt`] if the token is not well-formed.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        if Self::is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(SessionError::SessionCorrupt(
                "session token is malformed".to_string(),
            ))
        }
    }

    /// Syntactic check shared by the edge guard and record parsing.
    #[must_use]
    pub fn is_well_formed(raw: &str) -> bool {
        !raw.is_empty()
            && raw.len() <= MAX_TOKEN_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"._~+/=-".contains(&b))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

impl TryFrom<String> for SessionToken {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

/// Who is logged in. Always fully populated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRecord {
    user_id: String,
    display_name: String,
    email: String,
    role: Role,
    token: SessionToken,
}

impl SessionRecord {
    /// Build a record, rejecting blank fields.
    ///
    /// # Errors
    /// Returns [`SessionError::SessionCorrupt`] when a field is blank.
    pub fn new(
        user_id: &str,
        display_name: &str,
        email: &str,
        role: Role,
        token: SessionToken,
    ) -> Result<Self, SessionError> {
        for (field, value) in [
            ("user_id", user_id),
            ("display_name", display_name),
            ("email", email),
        ] {
            if value.trim().is_empty() {
                return Err(SessionError::SessionCorrupt(format!("{field} is empty")));
            }
        }

        Ok(Self {
            user_id: user_id.trim().to_string(),
            display_name: display_name.trim().to_string(),
            email: email.trim().to_string(),
            role,
            token,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Serialize the persisted projection written to storage and cookies.
    ///
    /// # Errors
    /// Returns [`SessionError::StorageUnavailable`] if serialization fails.
    pub fn to_mirror_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(&PersistedSession::from(self))
            .map_err(|err| SessionError::StorageUnavailable(err.to_string()))
    }

    /// Parse the persisted projection with the strict schema.
    ///
    /// # Errors
    /// Returns [`SessionError::SessionCorrupt`] for any shape or content mismatch.
    pub fn from_mirror_json(raw: &str) -> Result<Self, SessionError> {
        let persisted: PersistedSession = serde_json::from_str(raw)
            .map_err(|err| SessionError::SessionCorrupt(err.to_string()))?;
        Self::try_from(persisted)
    }
}

/// Stored shape of a session. Unknown fields are rejected.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedSession {
    user_id: String,
    display_name: String,
    email: String,
    role: Role,
    session_token: String,
}

impl From<&SessionRecord> for PersistedSession {
    fn from(record: &SessionRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            display_name: record.display_name.clone(),
            email: record.email.clone(),
            role: record.role,
            session_token: record.token.expose().to_string(),
        }
    }
}

impl TryFrom<PersistedSession> for SessionRecord {
    type Error = SessionError;

    fn try_from(persisted: PersistedSession) -> Result<Self, Self::Error> {
        let token = SessionToken::parse(&persisted.session_token)?;
        Self::new(
            &persisted.user_id,
            &persisted.display_name,
            &persisted.email,
            persisted.role,
            token,
        )
    }
}
