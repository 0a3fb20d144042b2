mod auth;
mod completions;
mod health;
mod journeys;
mod learning_styles;
mod options;
mod questions;
mod tutorials;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::middleware::auth::require_auth;
use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(learning_styles::router())
        .merge(completions::router())
        .merge(journeys::router())
        .merge(tutorials::router())
        .merge(questions::router())
        .merge(options::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(welcome))
        .nest("/health", health::router())
        .merge(auth::router())
        .merge(protected)
        .fallback(fallback_handler)
        .with_state(state)
}

async fn welcome() -> Response {
    (
        StatusCode::OK,
        Json(json!({ "message": "Welcome to api Learning App" })),
    )
        .into_response()
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found").into_response()
}
