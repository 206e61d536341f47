use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{classify, de_timestamp, SupabaseClient};
use crate::beers::{validate_note, BeerRepository, RepositoryError};
use crate::db::models::{BeerPost, BeerWithAuthor};

const BEERS: &str = "rest/v1/beers";
const COLUMNS: &str = "id,user_id,image_url,note,created_at";
const COLUMNS_WITH_AUTHOR: &str = "id,user_id,image_url,note,created_at,users(name)";

#[derive(Debug, Deserialize)]
struct BeerRow {
    id: String,
    user_id: String,
    image_url: String,
    note: String,
    #[serde(deserialize_with = "de_timestamp")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    users: Option<AuthorRow>,
}

#[derive(Debug, Deserialize)]
struct AuthorRow {
    name: Option<String>,
}

impl BeerRow {
    fn into_post(self) -> (BeerPost, Option<String>) {
        let name = self.users.and_then(|u| u.name);
        let post = BeerPost {
            id: self.id,
            user_id: self.user_id,
            image_url: self.image_url,
            note: self.note,
            created_at: self.created_at,
        };
        (post, name)
    }

    fn with_author(self) -> BeerWithAuthor {
        let (post, name) = self.into_post();
        BeerWithAuthor::new(post, name)
    }
}

impl SupabaseClient {
    async fn fetch_beers(&self, filter: &[(&str, String)]) -> Result<Vec<BeerWithAuthor>, RepositoryError> {
        let response = self
            .service(Method::GET, BEERS)
            .query(&[("select", COLUMNS_WITH_AUTHOR), ("order", "created_at.desc")])
            .query(filter)
            .send()
            .await?;

        let rows: Vec<BeerRow> = classify(response)
            .await?
            .map_err(|f| RepositoryError::Upstream(format!("list returned {}: {}", f.status, f.message)))?
            .json()
            .await?;

        Ok(rows.into_iter().map(BeerRow::with_author).collect())
    }
}

#[async_trait]
impl BeerRepository for SupabaseClient {
    async fn create(
        &self,
        author_id: &str,
        note: &str,
        image_url: &str,
    ) -> Result<BeerPost, RepositoryError> {
        let note = validate_note(note)?;

        let response = self
            .service(Method::POST, BEERS)
            .query(&[("select", COLUMNS)])
            .header("Prefer", "return=representation")
            .json(&json!({
                "user_id": author_id,
                "image_url": image_url,
                "note": note,
                "created_at": Utc::now(),
            }))
            .send()
            .await?;

        let rows: Vec<BeerRow> = classify(response)
            .await?
            .map_err(|f| RepositoryError::Upstream(format!("insert returned {}: {}", f.status, f.message)))?
            .json()
            .await?;

        rows.into_iter()
            .next()
            .map(|row| row.into_post().0)
            .ok_or_else(|| RepositoryError::Upstream("insert returned no row".into()))
    }

    async fn list_all(&self) -> Result<Vec<BeerWithAuthor>, RepositoryError> {
        self.fetch_beers(&[]).await
    }

    async fn list_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<BeerWithAuthor>, RepositoryError> {
        self.fetch_beers(&[("user_id", format!("eq.{author_id}"))]).await
    }

    async fn delete(&self, post_id: &str, author_id: &str) -> Result<(), RepositoryError> {
        // Filtering on both columns makes ownership part of the delete itself.
        let response = self
            .service(Method::DELETE, BEERS)
            .query(&[
                ("id", format!("eq.{post_id}")),
                ("user_id", format!("eq.{author_id}")),
                ("select", "id".to_string()),
            ])
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let deleted: Vec<serde_json::Value> = match classify(response).await? {
            Ok(response) => response.json().await?,
            // A malformed id is a 400 from PostgREST; it can't match a row either.
            // Any other rejection (bad key, RLS, missing table) is an upstream failure.
            Err(f) if f.status == StatusCode::BAD_REQUEST => Vec::new(),
            Err(f) => {
                return Err(RepositoryError::Upstream(format!(
                    "delete returned {}: {}",
                    f.status, f.message
                )))
            }
        };

        if deleted.is_empty() {
            return Err(RepositoryError::NotFound(
                "Beer not found or not owned by user".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::UNKNOWN_USER;

    #[test]
    fn row_with_embedded_author() {
        let row: BeerRow = serde_json::from_value(json!({
            "id": "b1",
            "user_id": "u1",
            "image_url": "https://x/storage/v1/object/public/beer-images/u1/a.png",
            "note": "IPA",
            "created_at": "2024-01-01T10:00:00+00:00",
            "users": { "name": "Alice" }
        }))
        .unwrap();
        let beer = row.with_author();
        assert_eq!(beer.user_name, "Alice");
        assert_eq!(beer.created_at, "2024-01-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn row_without_profile_falls_back_to_unknown() {
        let row: BeerRow = serde_json::from_value(json!({
            "id": "b1",
            "user_id": "u1",
            "image_url": "u",
            "note": "IPA",
            "created_at": "2024-01-01T10:00:00",
            "users": null
        }))
        .unwrap();
        assert_eq!(row.with_author().user_name, UNKNOWN_USER);
    }

    #[test]
    fn insert_representation_without_embed() {
        let row: BeerRow = serde_json::from_value(json!({
            "id": "b1",
            "user_id": "u1",
            "image_url": "u",
            "note": "IPA",
            "created_at": "2024-01-01T10:00:00.5+00:00"
        }))
        .unwrap();
        let (post, name) = row.into_post();
        assert_eq!(post.id, "b1");
        assert!(name.is_none());
    }
}
