#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use parking_lot::Mutex;
use serde_json::json;

use stockdesk::{
    api::{new_auth_header_slot, ApiClient},
    config::Settings,
    session::SessionService,
    storage::MemoryKvStore,
};

/// Backend stand-in the session layer talks to in these tests. Response
/// status, payload and latency are adjustable per endpoint, and every
/// endpoint counts its hits.
pub struct FixtureState {
    /// When set, endpoints answer 401 unless the request carries
    /// `Authorization: Token <value>`.
    pub require_token: Mutex<Option<String>>,

    pub company_status: Mutex<u16>,
    pub company_delay_ms: Mutex<u64>,
    pub company_hits: AtomicUsize,

    pub unread_status: Mutex<u16>,
    pub unread_counts: Mutex<(u32, u32)>,
    pub unread_hits: AtomicUsize,

    pub fond_status: Mutex<u16>,
    pub fond_leader: Mutex<bool>,
    pub fond_delay_ms: Mutex<u64>,
    pub fond_hits: AtomicUsize,
}

impl FixtureState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            require_token: Mutex::new(None),
            company_status: Mutex::new(200),
            company_delay_ms: Mutex::new(0),
            company_hits: AtomicUsize::new(0),
            unread_status: Mutex::new(200),
            unread_counts: Mutex::new((0, 0)),
            unread_hits: AtomicUsize::new(0),
            fond_status: Mutex::new(200),
            fond_leader: Mutex::new(false),
            fond_delay_ms: Mutex::new(0),
            fond_hits: AtomicUsize::new(0),
        })
    }
}

fn authorized(st: &FixtureState, headers: &HeaderMap) -> bool {
    let Some(required) = st.require_token.lock().clone() else {
        return true;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Token {required}"))
        .unwrap_or(false)
}

async fn company(
    State(st): State<Arc<FixtureState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    st.company_hits.fetch_add(1, Ordering::SeqCst);
    let delay = *st.company_delay_ms.lock();
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if !authorized(&st, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid token."})),
        );
    }
    match *st.company_status.lock() {
        200 => (
            StatusCode::OK,
            Json(json!({
                "name": "ACME AG",
                "isin": "DE0000000001",
                "share_count": 10_000,
            })),
        ),
        s => (
            StatusCode::from_u16(s).unwrap(),
            Json(json!({"detail": "error"})),
        ),
    }
}

async fn unread(
    State(st): State<Arc<FixtureState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    st.unread_hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&st, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid token."})),
        );
    }
    match *st.unread_status.lock() {
        200 => {
            let (messages, notifications) = *st.unread_counts.lock();
            (
                StatusCode::OK,
                Json(json!({
                    "unread_messages": messages,
                    "unread_notifications": notifications,
                })),
            )
        }
        s => (
            StatusCode::from_u16(s).unwrap(),
            Json(json!({"detail": "error"})),
        ),
    }
}

async fn fond(
    State(st): State<Arc<FixtureState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    st.fond_hits.fetch_add(1, Ordering::SeqCst);
    let delay = *st.fond_delay_ms.lock();
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if !authorized(&st, &headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid token."})),
        );
    }
    match *st.fond_status.lock() {
        200 => (
            StatusCode::OK,
            Json(json!({
                "id": 1,
                "name": "Alpha Fond",
                "leader": *st.fond_leader.lock(),
            })),
        ),
        404 => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Not found."})),
        ),
        s => (
            StatusCode::from_u16(s).unwrap(),
            Json(json!({"detail": "error"})),
        ),
    }
}

/// Binds the fixture on an ephemeral port and returns the API base url.
pub async fn spawn_fixture(state: Arc<FixtureState>) -> String {
    let app = Router::new()
        .route("/api/companies/get/active/", get(company))
        .route("/api/social/unread/", get(unread))
        .route("/api/fonds/user_data/", get(fond))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

/// Session service + API client wired the way `main` wires them, on an
/// in-memory key-value store.
pub fn client_stack(base_url: &str) -> (SessionService, ApiClient) {
    let settings = Settings {
        api_base_url: base_url.to_string(),
        http_timeout_secs: 5,
        guard_fencing: true,
        max_chat_messages: 5,
        unread_refresh_secs: 30,
        storage_path: ":memory:".to_string(),
    };
    let auth = new_auth_header_slot();
    let session = SessionService::new(Arc::new(MemoryKvStore::new()), auth.clone());
    let api = ApiClient::new(&settings, auth).unwrap();
    (session, api)
}
