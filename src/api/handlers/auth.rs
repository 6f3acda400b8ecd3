//! Mocked auth API answering the same contract the portal expects from the real
//! identity provider.

use crate::session::{
    backend::{AuthResponse, LoginRequest},
    persistor::{COOKIE_ROLE, COOKIE_SESSION, COOKIE_TOKEN},
    Credentials, MockAuthBackend, SessionError, SetCookie,
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, StatusCode},
    response::{AppendHeaders, IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
}

fn error_response(status: StatusCode, err: &SessionError) -> Response {
    (
        status,
        Json(ErrorBody {
            message: err.to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path= "/v1/auth/login",
    request_body = LoginRequest,
    responses (
        (status = 200, description = "Login successful", body = AuthResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed credentials", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
    ),
    tag= "auth"
)]
#[instrument(skip(backend))]
pub async fn login(
    backend: Extension<Arc<MockAuthBackend>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, &SessionError::MissingCredentials);
    };

    let credentials = Credentials::new(&request.email, &request.password);
    if let Err(err) = credentials.validate() {
        debug!("Rejecting login form: {err}");
        return error_response(StatusCode::BAD_REQUEST, &err);
    }

    match backend.authenticate(&credentials) {
        Ok(response) => {
            info!(user_id = %response.user.id, "Issued session token");
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(StatusCode::UNAUTHORIZED, &err),
    }
}

#[utoipa::path(
    post,
    path= "/v1/auth/logout",
    responses (
        (status = 204, description = "Session token released, session cookies expired"),
    ),
    tag= "auth"
)]
pub async fn logout() -> impl IntoResponse {
    let expired = [COOKIE_TOKEN, COOKIE_SESSION, COOKIE_ROLE]
        .map(|name| (SET_COOKIE, SetCookie::expired(name).header_value()));
    (StatusCode::NO_CONTENT, AppendHeaders(expired))
}
