// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::models::Snapshot;
use crate::monitor::Monitor;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) monitor: Arc<Monitor>,
    pub(crate) snapshots_tx: broadcast::Sender<Snapshot>,
    pub(crate) ws_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    monitor: Arc<Monitor>,
    snapshots_tx: broadcast::Sender<Snapshot>,
    ws_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        monitor,
        snapshots_tx,
        ws_connections,
        config,
    };
    Router::new()
        .route("/", get(|| async { "hostmon is running" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/fetch_monitor_data", post(http::fetch_monitor_data)) // POST /fetch_monitor_data
        .route("/api/history/{granularity}", get(http::history_handler)) // GET /api/history/{granularity}
        .route("/api/window", get(http::window_handler)) // GET /api/window
        .route("/ws", get(ws::ws_snapshots)) // WS /ws
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
