use crate::{
    config::PortalConfig,
    guard::{edge_guard, EdgeRouteGuard, GuardPolicy},
    session::MockAuthBackend,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{HeaderName, HeaderValue, Request},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub(crate) mod handlers;
mod openapi;

pub use openapi::openapi;

/// Page shells behind the edge guard, plus the unguarded auth API and health.
#[must_use]
pub fn router(config: &PortalConfig) -> Router {
    let edge = Arc::new(EdgeRouteGuard::new(GuardPolicy::new(config)));

    let pages = Router::new()
        .route("/", get(handlers::page))
        .route("/*path", get(handlers::page))
        .route_layer(middleware::from_fn_with_state(edge, edge_guard));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/runtime-config.json", get(handlers::runtime_config))
        .route("/v1/auth/login", post(handlers::login))
        .route("/v1/auth/logout", post(handlers::logout))
        .merge(pages)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(Arc::new(MockAuthBackend::new())))
                .layer(Extension(Arc::new(config.clone()))),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, config: PortalConfig) -> Result<()> {
    let app = router(&config);

    let listener = TcpListener::bind(format!("::0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!(
        auth_base_url = config.auth_base_url(),
        "Listening on [::]:{}", port
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {err}");
            }
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
