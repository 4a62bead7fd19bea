//! Read-only status surface.
//!
//! Three unauthenticated JSON endpoints reflecting the shared [`StatusStore`];
//! the serving task never touches the browser and keeps answering with the
//! last known state even after the monitor task has terminated.

use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::status::{MonitorState, MonitorStatus, StatusStore};

pub fn router(status: StatusStore) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/status", get(raw_status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(status)
}

async fn banner() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "running",
        "service": "admitwatch",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health plus the full status record; reports `initializing` until the
/// monitor has progressed past its initial state.
async fn health(State(status): State<StatusStore>) -> Json<serde_json::Value> {
    let snapshot = status.snapshot();
    if snapshot.state == MonitorState::Initializing {
        Json(serde_json::json!({ "status": "initializing" }))
    } else {
        Json(serde_json::json!({
            "status": "healthy",
            "monitor_status": snapshot,
        }))
    }
}

async fn raw_status(State(status): State<StatusStore>) -> Json<MonitorStatus> {
    Json(status.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn banner_names_the_service() {
        let Json(body) = banner().await;
        assert_eq!(body["service"], "admitwatch");
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn health_reports_initializing_before_first_transition() {
        let store = StatusStore::new();
        let Json(body) = health(State(store)).await;
        assert_eq!(body["status"], "initializing");
        assert!(body.get("monitor_status").is_none());
    }

    #[tokio::test]
    async fn health_embeds_status_once_running() {
        let store = StatusStore::new();
        store.set_state(MonitorState::Checking);
        store.record_check();

        let Json(body) = health(State(store)).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["monitor_status"]["state"], "checking");
        assert_eq!(body["monitor_status"]["checks_count"], 1);
    }

    #[tokio::test]
    async fn raw_status_reflects_the_store() {
        let store = StatusStore::new();
        store.set_state(MonitorState::Error);
        let Json(body) = raw_status(State(store)).await;
        assert_eq!(body.state, MonitorState::Error);
        assert_eq!(body.checks_count, 0);
    }
}
