use thiserror::Error;

/// Failures the session core can produce.
///
/// Only the login-facing variants are ever shown to a user. Corruption and storage
/// failures are recovered where they happen (purge, or degrade to memory-only).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("invalid email or password")]
    CredentialsInvalid,
    #[error("auth backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("session token rejected by auth backend")]
    TokenRejected,
    #[error("persisted session is corrupt: {0}")]
    SessionCorrupt(String),
    #[error("session storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl SessionError {
    /// Whether the error belongs in front of the user (login form feedback).
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::MissingCredentials
                | Self::InvalidEmail
                | Self::CredentialsInvalid
                | Self::BackendUnavailable(_)
        )
    }
}

/// Failure reported by a storage capability (durable store or cookie jar).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage is disabled")]
    Disabled,
    #[error("storage I/O failed: {0}")]
    Io(String),
    #[error("storage contents are not readable: {0}")]
    Format(String),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}
