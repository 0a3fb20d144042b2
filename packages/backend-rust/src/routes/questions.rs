use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use crate::response::{respond, AppError};
use crate::services::parse_id;
use crate::services::questions::{self, QuestionPayload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/tutorials/:tutorial_id/questions",
            get(list_questions).post(create_question),
        )
        .route(
            "/api/tutorials/:tutorial_id/questions/:question_id",
            get(get_question).put(update_question).delete(delete_question),
        )
}

fn parse_ids(tutorial_id: &str, question_id: &str) -> Result<(i64, i64), AppError> {
    Ok((
        parse_id(tutorial_id, "tutorial")?,
        parse_id(question_id, "question")?,
    ))
}

async fn list_questions(
    State(state): State<AppState>,
    Path(tutorial_id): Path<String>,
) -> Result<Response, AppError> {
    let tutorial_id = parse_id(&tutorial_id, "tutorial")?;
    let questions = questions::list_questions(state.repo(), tutorial_id).await?;
    Ok(respond(StatusCode::OK, questions, None))
}

async fn get_question(
    State(state): State<AppState>,
    Path((tutorial_id, question_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (tutorial_id, question_id) = parse_ids(&tutorial_id, &question_id)?;
    let question = questions::get_question(state.repo(), tutorial_id, question_id).await?;
    Ok(respond(StatusCode::OK, question, None))
}

async fn create_question(
    State(state): State<AppState>,
    Path(tutorial_id): Path<String>,
    payload: Option<Json<QuestionPayload>>,
) -> Result<Response, AppError> {
    let tutorial_id = parse_id(&tutorial_id, "tutorial")?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let question = questions::create_question(state.repo(), tutorial_id, payload).await?;
    Ok(respond(StatusCode::CREATED, question, None))
}

async fn update_question(
    State(state): State<AppState>,
    Path((tutorial_id, question_id)): Path<(String, String)>,
    payload: Option<Json<QuestionPayload>>,
) -> Result<Response, AppError> {
    let (tutorial_id, question_id) = parse_ids(&tutorial_id, &question_id)?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let question =
        questions::update_question(state.repo(), tutorial_id, question_id, payload).await?;
    Ok(respond(StatusCode::OK, question, None))
}

async fn delete_question(
    State(state): State<AppState>,
    Path((tutorial_id, question_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (tutorial_id, question_id) = parse_ids(&tutorial_id, &question_id)?;
    let question = questions::delete_question(state.repo(), tutorial_id, question_id).await?;
    Ok(respond(StatusCode::OK, question, None))
}
