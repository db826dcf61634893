//! Axum route handlers for the bookmark API.

use crate::form::FormValues;
use crate::store::BookmarkStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use bookmark_types::*;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub struct AppState {
    pub store: Arc<BookmarkStore>,
    pub start_time: Instant,
    pub flush_interval: Duration,
    pub last_flush_at: Arc<Mutex<Option<String>>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    Router::new()
        .route("/", get(hello))
        .route("/bookmark/set", post(set_bookmark))
        .route("/bookmark/get", get(get_bookmark))
        .route("/rpc/status", get(status))
        .route("/rpc/bookmarks/export", get(export))
        .fallback(hello)
        .with_state(state)
        .layer(cors)
}

/// Position from an untrusted form value; anything unparsable counts as 0.
fn parse_position(raw: &str) -> i64 {
    raw.parse().unwrap_or(0)
}

// GET /, and any path not routed above
pub async fn hello() -> &'static str {
    "Hello from Gondola Bookmarker!\n"
}

// POST /bookmark/set
pub async fn set_bookmark(State(state): State<Arc<AppState>>, form: FormValues) -> StatusCode {
    let item = form.value("item");
    let position = parse_position(form.value("time"));
    state.store.set(item, position);
    log::debug!("[BOOKMARKS] set {:?} = {}", item, position);
    StatusCode::OK
}

// GET /bookmark/get
pub async fn get_bookmark(
    State(state): State<Arc<AppState>>,
    form: FormValues,
) -> Json<BookmarkTime> {
    Json(BookmarkTime {
        time: state.store.get(form.value("item")),
    })
}

// GET /rpc/status
pub async fn status(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    (
        StatusCode::OK,
        Json(RpcResponse::ok(ServiceStatus {
            running: true,
            uptime_secs: state.start_time.elapsed().as_secs(),
            total_items: state.store.len(),
            pending_changes: state.store.is_dirty(),
            flush_interval_secs: state.flush_interval.as_secs(),
            last_flush_at: state.last_flush_at.lock().await.clone(),
        })),
    )
}

// GET /rpc/bookmarks/export
pub async fn export(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Bookmarks>>) {
    (StatusCode::OK, Json(RpcResponse::ok(state.store.entries())))
}
