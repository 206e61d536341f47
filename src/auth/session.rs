use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::auth::AuthError;
use crate::state::DbPool;

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: &str, hours: u64) -> Result<String, AuthError> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Look up the user owning an unexpired session token.
pub fn session_user(pool: &DbPool, token: &str) -> Result<Option<String>, AuthError> {
    let conn = pool.get()?;

    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
            params![token],
            |row| row.get(0),
        )
        .optional()?;

    Ok(user_id)
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn pool_with_user() -> (tempfile::TempDir, DbPool) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = db::create_pool(&tmp.path().join("test.db")).unwrap();
        db::run_migrations(&pool).unwrap();
        pool.get()
            .unwrap()
            .execute(
                "INSERT INTO users (id, email, name, password_hash) VALUES ('u1', 'a@b.c', 'A', 'x')",
                [],
            )
            .unwrap();
        (tmp, pool)
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn created_session_resolves_to_user() {
        let (_tmp, pool) = pool_with_user();
        let token = create_session(&pool, "u1", 1).unwrap();
        assert_eq!(session_user(&pool, &token).unwrap().as_deref(), Some("u1"));
    }

    #[test]
    fn unknown_token_resolves_to_none() {
        let (_tmp, pool) = pool_with_user();
        assert!(session_user(&pool, "not-a-token").unwrap().is_none());
    }

    #[test]
    fn expired_session_resolves_to_none() {
        let (_tmp, pool) = pool_with_user();
        let token = create_session(&pool, "u1", 1).unwrap();
        pool.get()
            .unwrap()
            .execute(
                "UPDATE sessions SET expires_at = datetime('now', '-1 hours') WHERE token = ?1",
                params![token],
            )
            .unwrap();
        assert!(session_user(&pool, &token).unwrap().is_none());
    }
}
