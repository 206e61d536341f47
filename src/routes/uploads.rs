use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::storage::local::resolve;

pub fn router() -> Router<AppState> {
    Router::new().route("/uploads/{*path}", get(serve))
}

/// GET /uploads/{*path}: images written by the local image store.
pub async fn serve(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let Some(file) = resolve(&state.config.uploads_path(), &key) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Ok(data) = tokio::fs::read(&file).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let content_type = mime_guess::from_path(&key).first_or_octet_stream().to_string();
    let headers = [
        (header::CONTENT_TYPE, content_type),
        // Objects are immutable: every key carries a fresh uuid.
        (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
    ];
    (headers, data).into_response()
}
