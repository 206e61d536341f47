// Library exports for beerlog
// The binary and the integration tests both build the app from here

pub mod auth;
pub mod beers;
pub mod config;
pub mod cors;
pub mod db;
pub mod error;
pub mod extractors;
pub mod leaderboard;
pub mod routes;
pub mod state;
pub mod storage;
pub mod supabase;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full HTTP application for the given state.
pub fn app(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes());

    let router = routes::router(&state)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http());

    cors::apply(router).with_state(state)
}
