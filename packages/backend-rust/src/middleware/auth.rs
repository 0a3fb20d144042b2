use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::auth::{extract_token, verify_access_token};
use crate::response::AppError;
use crate::state::AppState;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return AppError::unauthorized("Authentication token is required").into_response();
    };

    let Some(secret) = state.config().jwt_secret.as_deref() else {
        tracing::warn!("JWT_SECRET not configured, rejecting authenticated request");
        return AppError::unauthorized("Authentication failed").into_response();
    };

    match verify_access_token(&token, secret) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "access token rejected");
            AppError::unauthorized("Authentication failed").into_response()
        }
    }
}
