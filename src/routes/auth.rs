use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use crate::auth::{Credentials, Registration};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub user_id: String,
    pub access_token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Maps axum's plain-text JSON rejections onto the `{error}` shape.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e.body_text())))
}

/// POST /register
async fn register(
    State(state): State<AppState>,
    body: Result<Json<Registration>, JsonRejection>,
) -> AppResult<Json<SessionResponse>> {
    let registration = json_body(body)?;
    let session = state.identity.register(&registration).await?;

    Ok(Json(SessionResponse {
        message: "User registered successfully",
        user_id: session.user_id,
        access_token: session.access_token,
    }))
}

/// POST /login
async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> AppResult<Json<SessionResponse>> {
    let credentials = json_body(body)?;
    let session = state.identity.login(&credentials).await?;

    Ok(Json(SessionResponse {
        message: "Logged in",
        user_id: session.user_id,
        access_token: session.access_token,
    }))
}
