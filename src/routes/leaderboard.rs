use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::AppResult;
use crate::leaderboard::{self, LeaderboardEntry};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/leaderboard", get(show))
}

/// GET /leaderboard
async fn show(State(state): State<AppState>) -> AppResult<Json<Vec<LeaderboardEntry>>> {
    let posts = state.beers.list_all().await?;
    Ok(Json(leaderboard::build(&posts)))
}
