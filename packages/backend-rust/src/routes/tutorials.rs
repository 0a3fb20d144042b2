use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Json, Router};

use crate::auth::AuthUser;
use crate::response::{respond, AppError};
use crate::services::parse_id;
use crate::services::tutorials::{self, TutorialPayload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/journeys/:journey_id/tutorials",
            get(list_tutorials).post(create_tutorial),
        )
        .route(
            "/api/journeys/:journey_id/tutorials/:tutorial_id",
            get(get_tutorial).put(update_tutorial).delete(delete_tutorial),
        )
}

fn parse_ids(journey_id: &str, tutorial_id: &str) -> Result<(i64, i64), AppError> {
    Ok((
        parse_id(journey_id, "journey")?,
        parse_id(tutorial_id, "tutorial")?,
    ))
}

async fn list_tutorials(
    State(state): State<AppState>,
    Path(journey_id): Path<String>,
) -> Result<Response, AppError> {
    let journey_id = parse_id(&journey_id, "journey")?;
    let tutorials = tutorials::list_tutorials(state.repo(), journey_id).await?;
    Ok(respond(StatusCode::OK, tutorials, None))
}

async fn get_tutorial(
    State(state): State<AppState>,
    Path((journey_id, tutorial_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (journey_id, tutorial_id) = parse_ids(&journey_id, &tutorial_id)?;
    let tutorial = tutorials::get_tutorial(state.repo(), journey_id, tutorial_id).await?;
    Ok(respond(StatusCode::OK, tutorial, None))
}

async fn create_tutorial(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(journey_id): Path<String>,
    payload: Option<Json<TutorialPayload>>,
) -> Result<Response, AppError> {
    let journey_id = parse_id(&journey_id, "journey")?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let tutorial =
        tutorials::create_tutorial(state.repo(), journey_id, user.user_id, payload).await?;
    Ok(respond(StatusCode::CREATED, tutorial, None))
}

async fn update_tutorial(
    State(state): State<AppState>,
    Path((journey_id, tutorial_id)): Path<(String, String)>,
    payload: Option<Json<TutorialPayload>>,
) -> Result<Response, AppError> {
    let (journey_id, tutorial_id) = parse_ids(&journey_id, &tutorial_id)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let tutorial =
        tutorials::update_tutorial(state.repo(), journey_id, tutorial_id, payload).await?;
    Ok(respond(StatusCode::OK, tutorial, None))
}

async fn delete_tutorial(
    State(state): State<AppState>,
    Path((journey_id, tutorial_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (journey_id, tutorial_id) = parse_ids(&journey_id, &tutorial_id)?;
    let tutorial = tutorials::delete_tutorial(state.repo(), journey_id, tutorial_id).await?;
    Ok(respond(StatusCode::OK, tutorial, None))
}
