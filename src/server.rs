//! HTTP front for the annotation store.
//!
//! The viewer talks to these routes when it is rendered with a storage server:
//! - `GET /links/*url` and `POST /links/*url` read or replace one page's links
//! - `GET /links` and `POST /links` read or replace the whole map
//! - `GET /ping` answers `pong`
//!
//! Request bodies are parsed as JSON whatever their content type. A body that does not
//! parse stores an empty value instead of failing the request. Store access runs on the
//! blocking pool since every call touches the file.

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::store::{LinkMap, LinkStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LinkStore>,
}

impl AppState {
    pub fn new(store: LinkStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/links", get(get_all).post(save_all))
        .route("/links/*url", get(get_links).post(save_links))
        .route("/ping", get(ping))
        .layer(from_fn(cors_middleware))
        .layer(DefaultBodyLimit::max(Config::MAX_BODY_BYTES))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(
            "Annotation server listening on http://{} (store: {})",
            addr,
            state.store.path().display()
        );
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn ping() -> &'static str {
    "pong"
}

/// Run a store call off the async workers.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, StoreError>
where
    F: FnOnce(&LinkStore) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}

async fn get_links(State(state): State<AppState>, Path(url): Path<String>) -> Response {
    match with_store(&state, move |store| Ok(store.entry(&url))).await {
        Ok(entry) => Json(entry).into_response(),
        Err(e) => error_response(e),
    }
}

async fn save_links(State(state): State<AppState>, Path(url): Path<String>, body: Bytes) -> Response {
    let value: Value = serde_json::from_slice(&body).unwrap_or_else(|e| {
        tracing::debug!(url = %url, "Unparsable links body, storing empty list: {}", e);
        Value::Null
    });
    tracing::info!(
        url = %url,
        links = value.as_array().map_or(0, Vec::len),
        "Saving internal links"
    );
    status_response(with_store(&state, move |store| store.save_entry(&url, value)).await)
}

async fn get_all(State(state): State<AppState>) -> Response {
    match with_store(&state, |store| Ok(store.read_all())).await {
        Ok(all) => Json(all).into_response(),
        Err(e) => error_response(e),
    }
}

async fn save_all(State(state): State<AppState>, body: Bytes) -> Response {
    let all = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => LinkMap::new(),
    };
    tracing::info!(pages = all.len(), "Replacing annotation store");
    status_response(with_store(&state, move |store| store.save_all(&all)).await)
}

fn status_response(result: Result<(), StoreError>) -> Response {
    match result {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: StoreError) -> Response {
    tracing::error!("Annotation store failure: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"status": "error", "message": e.to_string()})),
    )
        .into_response()
}

async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        add_cors_headers(&mut resp);
        return resp;
    }

    let mut resp = next.run(req).await;
    add_cors_headers(&mut resp);
    resp
}

fn add_cors_headers(resp: &mut Response) {
    let headers = resp.headers_mut();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("content-type"),
    );
}
