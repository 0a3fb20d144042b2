use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::response::{ok, AppError};
use crate::services::learning_style::queries;
use crate::services::parse_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/process-learning-style", post(process_learning_style))
        .route("/api/my-learning-style", get(my_learning_style))
        .route("/api/my-latest-learning-style", get(my_latest_learning_style))
        .route("/api/user-learning-style/:user_id", get(user_learning_style))
        .route(
            "/api/user-learning-style/latest/:user_id",
            get(user_latest_learning_style),
        )
        .route("/api/user-learning-styles", get(learning_styles_for_period))
}

#[derive(Debug, Default, Deserialize)]
struct PeriodBody {
    period: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PeriodQuery {
    period: Option<String>,
}

async fn process_learning_style(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    body: Option<Json<PeriodBody>>,
) -> Result<Response, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let period = queries::parse_required_period(body.period.as_deref())?;

    tracing::info!(user_id = user.user_id, period = %period, "manual learning style run requested");
    let report = state.pipeline().process_period(period).await?;

    Ok(ok(report, "Learning style processing completed"))
}

async fn my_learning_style(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let record =
        queries::user_learning_style(state.repo(), user.user_id, query.period.as_deref()).await?;
    Ok(ok(record, "Learning style retrieved successfully"))
}

async fn my_latest_learning_style(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, AppError> {
    let record = queries::latest_user_learning_style(state.repo(), user.user_id).await?;
    Ok(ok(record, "Latest learning style retrieved successfully"))
}

async fn user_learning_style(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let user_id = parse_id(&user_id, "user")?;
    let record =
        queries::user_learning_style(state.repo(), user_id, query.period.as_deref()).await?;
    Ok(ok(record, "Learning style retrieved successfully"))
}

async fn user_latest_learning_style(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response, AppError> {
    let user_id = parse_id(&user_id, "user")?;
    let record = queries::latest_user_learning_style(state.repo(), user_id).await?;
    Ok(ok(record, "Latest learning style retrieved successfully"))
}

async fn learning_styles_for_period(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, AppError> {
    let records = queries::learning_styles_for_period(state.repo(), query.period.as_deref()).await?;
    Ok(ok(records, "Learning styles retrieved successfully"))
}
