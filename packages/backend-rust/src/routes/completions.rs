use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::post;
use axum::{Extension, Json, Router};

use crate::auth::AuthUser;
use crate::response::{created, AppError};
use crate::services::completions::{self, StudyDurationPayload};
use crate::services::parse_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/journeys/:journey_id/study-duration",
        post(record_study_duration),
    )
}

async fn record_study_duration(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(journey_id): Path<String>,
    payload: Option<Json<StudyDurationPayload>>,
) -> Result<Response, AppError> {
    let journey_id = parse_id(&journey_id, "journey")?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let completion = completions::record_study_duration(
        state.repo(),
        journey_id,
        user.user_id,
        payload,
        chrono::Utc::now(),
    )
    .await?;

    Ok(created(completion, "Created successfully"))
}
