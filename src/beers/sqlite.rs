use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::params;

use crate::beers::{validate_note, BeerRepository, RepositoryError};
use crate::db::models::{BeerPost, BeerWithAuthor};
use crate::state::DbPool;

const SELECT_WITH_AUTHOR: &str = "SELECT b.id, b.user_id, b.image_url, b.note, b.created_at, u.name
     FROM beers b
     LEFT JOIN users u ON u.id = b.user_id";

/// SQLite implementation
pub struct SqliteBeerRepository {
    pool: DbPool,
}

impl SqliteBeerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn query(
        &self,
        filter: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<BeerWithAuthor>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("{SELECT_WITH_AUTHOR} {filter} ORDER BY b.created_at DESC, b.rowid DESC");
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt.query_map(args, |row| {
            let created_at: String = row.get(4)?;
            let post = BeerPost {
                id: row.get(0)?,
                user_id: row.get(1)?,
                image_url: row.get(2)?,
                note: row.get(3)?,
                created_at: parse_timestamp(&created_at),
            };
            Ok(BeerWithAuthor::new(post, row.get(5)?))
        })?;

        let beers = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(beers)
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            tracing::warn!("Unparseable created_at {:?}: {}", raw, e);
            DateTime::<Utc>::default()
        })
}

#[async_trait]
impl BeerRepository for SqliteBeerRepository {
    async fn create(
        &self,
        author_id: &str,
        note: &str,
        image_url: &str,
    ) -> Result<BeerPost, RepositoryError> {
        let note = validate_note(note)?;
        let post = BeerPost {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: author_id.to_string(),
            image_url: image_url.to_string(),
            note,
            created_at: Utc::now(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO beers (id, user_id, image_url, note, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                post.id,
                post.user_id,
                post.image_url,
                post.note,
                format_timestamp(&post.created_at)
            ],
        )?;

        Ok(post)
    }

    async fn list_all(&self) -> Result<Vec<BeerWithAuthor>, RepositoryError> {
        self.query("", &[])
    }

    async fn list_by_author(
        &self,
        author_id: &str,
    ) -> Result<Vec<BeerWithAuthor>, RepositoryError> {
        self.query("WHERE b.user_id = ?1", &[&author_id])
    }

    async fn delete(&self, post_id: &str, author_id: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;

        let rows = conn.execute(
            "DELETE FROM beers WHERE id = ?1 AND user_id = ?2",
            params![post_id, author_id],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound(
                "Beer not found or not owned by user".into(),
            ));
        }
        Ok(())
    }
}
