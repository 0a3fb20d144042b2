use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db::HealthCheckSnapshot;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/live", get(live))
        .route("/ready", get(ready))
}

#[derive(Serialize)]
struct CompatHealthResponse {
    status: &'static str,
    database: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LivenessResponse {
    status: &'static str,
    timestamp: String,
    start_time: String,
    uptime: u64,
    version: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    storage: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<HealthCheckSnapshot>,
    learning_style_worker: bool,
}

enum DbCheckStatus {
    InMemory,
    Connected(HealthCheckSnapshot),
    Disconnected(HealthCheckSnapshot),
}

async fn database_check(state: &AppState) -> DbCheckStatus {
    let Some(proxy) = state.db_proxy() else {
        return DbCheckStatus::InMemory;
    };

    let snapshot = proxy.health_status().await;
    if snapshot.healthy {
        DbCheckStatus::Connected(snapshot)
    } else {
        DbCheckStatus::Disconnected(snapshot)
    }
}

async fn root(State(state): State<AppState>) -> Response {
    let (status_code, status, database) = match database_check(&state).await {
        DbCheckStatus::InMemory => (StatusCode::OK, "ok", "in-memory"),
        DbCheckStatus::Connected(_) => (StatusCode::OK, "ok", "connected"),
        DbCheckStatus::Disconnected(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "disconnected")
        }
    };

    let response = CompatHealthResponse {
        status,
        database,
        timestamp: now_iso(),
    };
    (status_code, Json(response)).into_response()
}

async fn live(State(state): State<AppState>) -> Response {
    Json(LivenessResponse {
        status: "healthy",
        timestamp: now_iso(),
        start_time: system_time_iso(state.started_at_system()),
        uptime: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
    })
    .into_response()
}

async fn ready(State(state): State<AppState>) -> Response {
    let (status_code, status, storage, database) = match database_check(&state).await {
        DbCheckStatus::InMemory => (StatusCode::OK, "healthy", "memory", None),
        DbCheckStatus::Connected(snapshot) => {
            let status = if snapshot.degraded { "degraded" } else { "healthy" };
            (StatusCode::OK, status, "postgres", Some(snapshot))
        }
        DbCheckStatus::Disconnected(snapshot) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "unhealthy",
            "postgres",
            Some(snapshot),
        ),
    };

    let response = ReadinessResponse {
        status,
        timestamp: now_iso(),
        uptime: state.uptime_seconds(),
        storage,
        database,
        learning_style_worker: crate::workers::is_worker_leader()
            && state.config().learning_style.worker_enabled,
    };
    (status_code, Json(response)).into_response()
}

fn system_time_iso(time: std::time::SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
