use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};

use crate::response::{respond, AppError};
use crate::services::journeys::{self, JourneyPayload};
use crate::services::parse_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/journeys", get(list_journeys).post(create_journey))
        .route(
            "/api/journeys/:journey_id",
            get(get_journey).put(update_journey).delete(delete_journey),
        )
}

async fn list_journeys(State(state): State<AppState>) -> Result<Response, AppError> {
    let journeys = journeys::list_journeys(state.repo()).await?;
    Ok(respond(StatusCode::OK, journeys, None))
}

async fn get_journey(
    State(state): State<AppState>,
    Path(journey_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&journey_id, "journey")?;
    let journey = journeys::get_journey(state.repo(), id).await?;
    Ok(respond(StatusCode::OK, journey, None))
}

async fn create_journey(
    State(state): State<AppState>,
    payload: Option<Json<JourneyPayload>>,
) -> Result<Response, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let journey = journeys::create_journey(state.repo(), payload).await?;
    Ok(respond(StatusCode::CREATED, journey, None))
}

async fn update_journey(
    State(state): State<AppState>,
    Path(journey_id): Path<String>,
    payload: Option<Json<JourneyPayload>>,
) -> Result<Response, AppError> {
    let id = parse_id(&journey_id, "journey")?;
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let journey = journeys::update_journey(state.repo(), id, payload).await?;
    Ok(respond(StatusCode::OK, journey, None))
}

async fn delete_journey(
    State(state): State<AppState>,
    Path(journey_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&journey_id, "journey")?;
    let journey = journeys::delete_journey(state.repo(), id).await?;
    Ok(respond(StatusCode::OK, journey, None))
}
