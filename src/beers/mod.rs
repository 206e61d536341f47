pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{BeerPost, BeerWithAuthor};

pub const MAX_NOTE_CHARS: usize = 250;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// Trims a note and checks it is non-empty and at most 250 characters.
pub fn validate_note(note: &str) -> Result<String, RepositoryError> {
    let note = note.trim();
    if note.is_empty() {
        return Err(RepositoryError::Validation("Note is required".into()));
    }
    if note.chars().count() > MAX_NOTE_CHARS {
        return Err(RepositoryError::Validation(format!(
            "Note too long (max {MAX_NOTE_CHARS} characters)"
        )));
    }
    Ok(note.to_string())
}

/// Persistence for beer posts. Every listing is newest first.
#[async_trait]
pub trait BeerRepository: Send + Sync {
    /// Store a post with a server-generated id and timestamp.
    async fn create(
        &self,
        author_id: &str,
        note: &str,
        image_url: &str,
    ) -> Result<BeerPost, RepositoryError>;

    /// All posts with their author's display name joined on.
    async fn list_all(&self) -> Result<Vec<BeerWithAuthor>, RepositoryError>;

    async fn list_by_author(&self, author_id: &str)
        -> Result<Vec<BeerWithAuthor>, RepositoryError>;

    /// Delete a post only if `author_id` owns it. Anything else is `NotFound`.
    async fn delete(&self, post_id: &str, author_id: &str) -> Result<(), RepositoryError>;
}
