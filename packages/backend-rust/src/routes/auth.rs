use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::delete;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::response::AppError;
use crate::services::sessions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth/logout", delete(logout))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutBody {
    #[serde(alias = "refresh_token")]
    refresh_token: Option<String>,
}

async fn logout(
    State(state): State<AppState>,
    body: Option<Json<LogoutBody>>,
) -> Result<Response, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    sessions::logout(state.repo(), body.refresh_token.as_deref()).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Refresh token deleted successfully" })),
    )
        .into_response())
}
