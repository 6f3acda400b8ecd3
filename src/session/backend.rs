//! The authentication backend as seen from the session core.
//!
//! The core only needs "credentials in, identity and token out". Two
//! implementations exist: [`MockAuthBackend`] answers from a fixed user directory
//! (the portal has no real identity provider), and [`HttpAuthBackend`] calls the
//! same contract over HTTP at the configured base address.

use super::{
    error::SessionError,
    record::{Role, SessionRecord, SessionToken},
};
use crate::config::PortalConfig;
use regex::Regex;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt, future::Future, time::Duration};
use tracing::{debug, warn};
use ulid::Ulid;
use url::Url;
use utoipa::ToSchema;

/// Login form input. The password never appears in `Debug` output.
#[derive(Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: normalize_email(email),
            password: SecretString::from(password.to_string()),
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }

    /// Form-level checks done before any backend call.
    ///
    /// # Errors
    /// [`SessionError::MissingCredentials`] for blank fields,
    /// [`SessionError::InvalidEmail`] for a malformed address.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.email.is_empty() || self.password.expose_secret().is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        if !valid_email(&self.email) {
            return Err(SessionError::InvalidEmail);
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Normalize an email for lookups.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Successful login answer: who the user is and their bearer token.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}

impl AuthResponse {
    /// Turn the backend answer into a complete session.
    ///
    /// # Errors
    /// [`SessionError::BackendUnavailable`] if the answer is incomplete or the
    /// token is malformed.
    pub fn into_record(self) -> Result<SessionRecord, SessionError> {
        let token = SessionToken::parse(&self.token)
            .map_err(|_| SessionError::BackendUnavailable("malformed token in login response".to_string()))?;
        SessionRecord::new(
            &self.user.id,
            &self.user.name,
            &self.user.email,
            self.user.role,
            token,
        )
        .map_err(|err| SessionError::BackendUnavailable(format!("incomplete login response: {err}")))
    }
}

pub trait AuthBackend: Send + Sync {
    /// Authenticate. A rejection is [`SessionError::CredentialsInvalid`].
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, SessionError>> + Send;

    /// Tell the backend the token is no longer in use. Callers may ignore failures.
    fn logout(&self, token: &SessionToken) -> impl Future<Output = Result<(), SessionError>> + Send;
}

#[derive(Clone)]
struct MockUser {
    id: String,
    name: String,
    email: String,
    password: SecretString,
    role: Role,
}

/// Fixed user directory standing in for the real identity provider.
#[derive(Clone)]
pub struct MockAuthBackend {
    users: Vec<MockUser>,
}

impl MockAuthBackend {
    /// Directory with the two portal demo accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::empty()
            .with_user("1", "Juan Pérez", "cliente@correo.com", "1234", Role::Customer)
            .with_user(
                "2",
                "Carla Supervisor",
                "admin@correo.com",
                "1234",
                Role::Administrator,
            )
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { users: Vec::new() }
    }

    #[must_use]
    pub fn with_user(mut self, id: &str, name: &str, email: &str, password: &str, role: Role) -> Self {
        self.users.push(MockUser {
            id: id.to_string(),
            name: name.to_string(),
            email: normalize_email(email),
            password: SecretString::from(password.to_string()),
            role,
        });
        self
    }

    /// Synchronous lookup shared by the trait impl and the HTTP handler.
    ///
    /// # Errors
    /// [`SessionError::CredentialsInvalid`] when no user matches.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<AuthResponse, SessionError> {
        let user = self
            .users
            .iter()
            .find(|user| {
                user.email == credentials.email()
                    && user.password.expose_secret() == credentials.password().expose_secret()
            })
            .ok_or(SessionError::CredentialsInvalid)?;

        debug!(user_id = %user.id, role = %user.role, "mock login accepted");

        Ok(AuthResponse {
            user: UserProfile {
                id: user.id.clone(),
                name: user.name.clone(),
                email: user.email.clone(),
                role: user.role,
            },
            token: format!("mock-token-{}", Ulid::new()),
        })
    }
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MockAuthBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockAuthBackend")
            .field("users", &self.users.len())
            .finish()
    }
}

impl AuthBackend for MockAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, SessionError> {
        self.authenticate(credentials)
    }

    async fn logout(&self, _token: &SessionToken) -> Result<(), SessionError> {
        Ok(())
    }
}

/// HTTP client for the auth API (`{base}/auth/login`, `{base}/auth/logout`).
#[derive(Clone, Debug)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAuthBackend {
    /// # Errors
    /// [`SessionError::BackendUnavailable`] if the URL is invalid or the client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SessionError> {
        let base_url = Url::parse(base_url.trim()).map_err(|err| {
            SessionError::BackendUnavailable(format!("invalid auth base URL {base_url}: {err}"))
        })?;
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| SessionError::BackendUnavailable(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// Client for the configured auth base URL and request timeout.
    ///
    /// # Errors
    /// Same as [`HttpAuthBackend::new`].
    pub fn from_config(config: &PortalConfig) -> Result<Self, SessionError> {
        Self::new(config.auth_base_url(), config.request_timeout())
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Request to `{base}/{path}` carrying the session's bearer token.
    #[must_use]
    pub fn authorized(&self, method: Method, path: &str, token: &SessionToken) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(path))
            .bearer_auth(token.expose())
    }

    /// Authenticated `GET` decoding a JSON body.
    ///
    /// # Errors
    /// [`SessionError::TokenRejected`] on 401, otherwise
    /// [`SessionError::BackendUnavailable`].
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &SessionToken,
    ) -> Result<T, SessionError> {
        let response = self
            .authorized(Method::GET, path, token)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;
        authorized_status(response.status())?;
        response
            .json::<T>()
            .await
            .map_err(|err| SessionError::BackendUnavailable(format!("invalid response from {path}: {err}")))
    }
}

/// Status check for calls made with a bearer token.
fn authorized_status(status: StatusCode) -> Result<(), SessionError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::UNAUTHORIZED {
        debug!("Auth backend rejected bearer token");
        Err(SessionError::TokenRejected)
    } else {
        Err(SessionError::BackendUnavailable(format!(
            "unexpected status {status}"
        )))
    }
}

fn transport_error(err: &reqwest::Error) -> SessionError {
    if err.is_timeout() {
        SessionError::BackendUnavailable("request timed out".to_string())
    } else {
        SessionError::BackendUnavailable(err.to_string())
    }
}

impl AuthBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, SessionError> {
        let body = LoginRequest {
            email: credentials.email().to_string(),
            password: credentials.password().expose_secret().to_string(),
        };
        let response = self
            .client
            .post(self.endpoint("auth/login"))
            .json(&body)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;

        match response.status() {
            StatusCode::OK => response
                .json::<AuthResponse>()
                .await
                .map_err(|err| SessionError::BackendUnavailable(format!("invalid login response: {err}"))),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST => Err(SessionError::CredentialsInvalid),
            status => {
                warn!("Auth backend answered login with {status}");
                Err(SessionError::BackendUnavailable(format!(
                    "unexpected status {status}"
                )))
            }
        }
    }

    async fn logout(&self, token: &SessionToken) -> Result<(), SessionError> {
        let response = self
            .authorized(Method::POST, "auth/logout", token)
            .send()
            .await
            .map_err(|err| transport_error(&err))?;

        authorized_status(response.status())
    }
}
