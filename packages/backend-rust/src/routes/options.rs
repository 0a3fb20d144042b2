use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::response::{respond, AppError};
use crate::services::options::{self, OptionPayload};
use crate::services::parse_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/questions/:question_id/options",
            get(list_options).post(create_option),
        )
        .route(
            "/api/questions/:question_id/options/:option_id",
            put(update_option).delete(delete_option),
        )
}

fn parse_ids(question_id: &str, option_id: &str) -> Result<(i64, i64), AppError> {
    Ok((
        parse_id(question_id, "question")?,
        parse_id(option_id, "option")?,
    ))
}

async fn list_options(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
) -> Result<Response, AppError> {
    let question_id = parse_id(&question_id, "question")?;
    let options = options::list_options(state.repo(), question_id).await?;
    Ok(respond(StatusCode::OK, options, None))
}

async fn create_option(
    State(state): State<AppState>,
    Path(question_id): Path<String>,
    payload: Option<Json<OptionPayload>>,
) -> Result<Response, AppError> {
    let question_id = parse_id(&question_id, "question")?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let option = options::create_option(state.repo(), question_id, payload).await?;
    Ok(respond(StatusCode::CREATED, option, None))
}

async fn update_option(
    State(state): State<AppState>,
    Path((question_id, option_id)): Path<(String, String)>,
    payload: Option<Json<OptionPayload>>,
) -> Result<Response, AppError> {
    let (question_id, option_id) = parse_ids(&question_id, &option_id)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let option = options::update_option(state.repo(), question_id, option_id, payload).await?;
    Ok(respond(StatusCode::OK, option, None))
}

async fn delete_option(
    State(state): State<AppState>,
    Path((question_id, option_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (question_id, option_id) = parse_ids(&question_id, &option_id)?;
    let option = options::delete_option(state.repo(), question_id, option_id).await?;
    Ok(respond(StatusCode::OK, option, None))
}
