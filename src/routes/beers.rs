use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::beers::validate_note;
use crate::db::models::BeerWithAuthor;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::storage::{self, ImageUpload};

#[derive(Serialize)]
pub struct CreatedBeer {
    pub message: &'static str,
    pub beer_id: String,
    pub image_url: String,
}

#[derive(Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub beer_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/beers", get(list_all).post(create_beer))
        .route("/beers/my", get(list_mine))
        .route("/beers/{id}", delete(delete_beer))
        // Paths used by older frontend builds
        .route("/all-beers", get(list_all))
        .route("/my-beers", get(list_mine))
        .route("/delete-beer", delete(delete_beer_by_query))
}

/// Note and optional image pulled out of a multipart form.
struct BeerForm {
    note: Option<String>,
    image: Option<ImageUpload>,
}

async fn read_form(mut multipart: Multipart) -> AppResult<BeerForm> {
    let mut form = BeerForm {
        note: None,
        image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {}", e.body_text())))?
    {
        match field.name() {
            Some("note") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed note: {}", e.body_text())))?;
                form.note = Some(text);
            }
            Some("image") => {
                let filename = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Malformed image: {}", e.body_text())))?;
                form.image = Some(ImageUpload { filename, data });
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /beers
async fn create_beer(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<CreatedBeer>> {
    let multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let form = read_form(multipart).await?;

    // Reject bad notes before anything is uploaded.
    let note = validate_note(form.note.as_deref().unwrap_or_default())?;

    let image_url = storage::intake(
        state.images.as_ref(),
        &user.id,
        form.image,
        &state.config.storage.placeholder_url,
    )
    .await;

    let post = state.beers.create(&user.id, &note, &image_url).await?;
    tracing::info!(beer_id = %post.id, user_id = %user.id, "Beer posted");

    Ok(Json(CreatedBeer {
        message: "Beer posted successfully",
        beer_id: post.id,
        image_url: post.image_url,
    }))
}

/// GET /beers
async fn list_all(State(state): State<AppState>) -> AppResult<Json<Vec<BeerWithAuthor>>> {
    Ok(Json(state.beers.list_all().await?))
}

/// GET /beers/my
async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<BeerWithAuthor>>> {
    Ok(Json(state.beers.list_by_author(&user.id).await?))
}

/// DELETE /beers/{id}
async fn delete_beer(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Message>> {
    remove(&state, &user, &id).await
}

/// DELETE /delete-beer?beer_id=...
async fn delete_beer_by_query(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<DeleteQuery>,
) -> AppResult<Json<Message>> {
    let id = query
        .beer_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing beer_id parameter".into()))?;
    remove(&state, &user, &id).await
}

async fn remove(state: &AppState, user: &CurrentUser, id: &str) -> AppResult<Json<Message>> {
    state.beers.delete(id, &user.id).await?;
    tracing::info!(beer_id = %id, user_id = %user.id, "Beer deleted");

    Ok(Json(Message {
        message: "Beer deleted successfully",
    }))
}
