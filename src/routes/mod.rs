pub mod auth;
pub mod beers;
pub mod leaderboard;
pub mod uploads;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::config::BackendKind;
use crate::error::AppError;
use crate::state::AppState;

/// Every endpoint, mounted at the root and again under `/api`.
pub fn router(state: &AppState) -> Router<AppState> {
    let api = Router::new()
        .route("/health", get(health))
        .merge(auth::router())
        .merge(beers::router())
        .merge(leaderboard::router());

    let mut app = Router::new().merge(api.clone()).nest("/api", api);

    if state.config.backend.kind == BackendKind::Local {
        app = app.merge(uploads::router());
    }

    app.method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "backend": state.config.backend.kind.as_str() }))
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
