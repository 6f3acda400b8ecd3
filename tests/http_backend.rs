use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ecportal::{
    api,
    client::PortalClient,
    config::PortalConfig,
    session::{
        storage::{DisabledStorage, MemoryCookieJar, MemoryStore},
        AuthBackend, Credentials, HistoryNavigator, HttpAuthBackend, Role, SessionError,
        SessionToken,
    },
};
use serde_json::{json, Value};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use url::Url;

async fn spawn_portal() -> SocketAddr {
    spawn(api::router(&PortalConfig::default())).await
}

/// The portal plus account routes: `/v1/cuenta` accepts the session,
/// `/v1/facturas` answers 401 as an expired token would.
async fn spawn_portal_with_account_routes() -> SocketAddr {
    let app = api::router(&PortalConfig::default())
        .route(
            "/v1/cuenta",
            get(|| async { Json(json!({ "numero": "EC-001" })) }),
        )
        .route("/v1/facturas", get(|| async { StatusCode::UNAUTHORIZED }));
    spawn(app).await
}

async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|err| panic!("{err}"));
    let addr = listener.local_addr().unwrap_or_else(|err| panic!("{err}"));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service()).await;
    });
    addr
}

fn backend(addr: SocketAddr) -> HttpAuthBackend {
    HttpAuthBackend::new(&format!("http://{addr}/v1/"), Duration::from_secs(5))
        .unwrap_or_else(|err| panic!("{err}"))
}

#[tokio::test]
async fn login_over_http() {
    let addr = spawn_portal().await;
    let response = backend(addr)
        .login(&Credentials::new("cliente@correo.com", "1234"))
        .await
        .unwrap_or_else(|err| panic!("{err}"));

    assert_eq!(response.user.name, "Juan Pérez");
    assert_eq!(response.user.role, Role::Customer);

    let record = response
        .into_record()
        .unwrap_or_else(|err| panic!("{err}"));
    assert!(record.token().expose().starts_with("mock-token-"));
}

#[tokio::test]
async fn wrong_password_over_http() {
    let addr = spawn_portal().await;
    let result = backend(addr)
        .login(&Credentials::new("admin@correo.com", "nope"))
        .await;

    assert!(matches!(result, Err(SessionError::CredentialsInvalid)));
}

#[tokio::test]
async fn unreachable_backend_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap_or_else(|err| panic!("{err}"));
    let addr = listener.local_addr().unwrap_or_else(|err| panic!("{err}"));
    drop(listener);

    let result = backend(addr)
        .login(&Credentials::new("admin@correo.com", "1234"))
        .await;

    assert!(matches!(result, Err(SessionError::BackendUnavailable(_))));
}

#[tokio::test]
async fn portal_client_round_trip_over_http() {
    let addr = spawn_portal().await;
    let navigator = Arc::new(HistoryNavigator::new("/login"));
    let client = PortalClient::new(
        &PortalConfig::default(),
        backend(addr),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCookieJar::new()),
        navigator.clone(),
    );
    client.hydrate();

    let record = client
        .login(Credentials::new("admin@correo.com", "1234"))
        .await
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(record.role(), Role::Administrator);
    assert_eq!(navigator.current().as_deref(), Some("/admin/bienvenida"));

    client.logout().await;
    assert!(client.store().get().is_none());
    assert_eq!(navigator.entries(), vec!["/"]);
}

#[tokio::test]
async fn logout_with_rejected_token_is_token_rejected() {
    let app = Router::new().route(
        "/v1/auth/logout",
        post(|| async { StatusCode::UNAUTHORIZED }),
    );
    let stub = spawn(app).await;

    let token = SessionToken::parse("mock-token-1").unwrap_or_else(|err| panic!("{err}"));
    let result = backend(stub).logout(&token).await;

    assert_eq!(result, Err(SessionError::TokenRejected));
}

#[tokio::test]
async fn expired_token_on_authenticated_call_ends_the_session() {
    let addr = spawn_portal_with_account_routes().await;
    let api = backend(addr);
    let navigator = Arc::new(HistoryNavigator::new("/login"));
    let client = PortalClient::new(
        &PortalConfig::default(),
        api.clone(),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryCookieJar::new()),
        navigator.clone(),
    );
    client.hydrate();
    let _ = client
        .login(Credentials::new("cliente@correo.com", "1234"))
        .await
        .unwrap_or_else(|err| panic!("{err}"));

    let account = {
        let api = api.clone();
        client
            .authorized(|token| async move { api.get_json::<Value>("cuenta", &token).await })
            .await
    };
    assert_eq!(account.ok(), Some(json!({ "numero": "EC-001" })));
    assert!(client.store().is_authenticated());

    let invoices = client
        .authorized(|token| async move { api.get_json::<Value>("facturas", &token).await })
        .await;

    assert_eq!(invoices, Err(SessionError::TokenRejected));
    assert!(client.store().get().is_none());
    assert!(client.persistor().read().is_none());
    assert_eq!(navigator.current().as_deref(), Some("/login"));
}

#[tokio::test]
async fn backend_from_config_reaches_the_portal() {
    let addr = spawn_portal().await;
    let base = Url::parse(&format!("http://{addr}/v1")).unwrap_or_else(|err| panic!("{err}"));
    let config = PortalConfig::default()
        .with_auth_base_url(&base)
        .with_request_timeout(Duration::from_secs(2));
    let backend = HttpAuthBackend::from_config(&config).unwrap_or_else(|err| panic!("{err}"));

    let response = backend
        .login(&Credentials::new("admin@correo.com", "1234"))
        .await;

    assert!(response.is_ok_and(|response| response.user.role == Role::Administrator));
}

#[tokio::test]
async fn disabled_storage_still_navigates() {
    let addr = spawn_portal().await;
    let navigator = Arc::new(HistoryNavigator::new("/cliente/bienvenida"));
    let client = PortalClient::new(
        &PortalConfig::default(),
        backend(addr),
        Arc::new(DisabledStorage),
        Arc::new(DisabledStorage),
        navigator.clone(),
    );

    assert!(client.hydrate().is_none());
    assert!(client.signal().is_resolved());
    assert_eq!(
        client.visit("/cliente/bienvenida"),
        ecportal::guard::ClientDecision::Redirect("/login".to_string())
    );

    let record = client
        .login(Credentials::new("cliente@correo.com", "1234"))
        .await
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(client.store().get(), Some(record));
    assert_eq!(
        client.visit("/cliente/bienvenida"),
        ecportal::guard::ClientDecision::Render
    );
}
