use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::auth::session::{create_session, session_user};
use crate::auth::{AuthError, Credentials, IdentityProvider, Registration};
use crate::db::models::Session;
use crate::state::DbPool;

/// SQLite-backed identity provider: bcrypt password hashes and random
/// session tokens looked up on every request.
pub struct LocalIdentity {
    pool: DbPool,
    session_hours: u64,
    hash_cost: u32,
}

impl LocalIdentity {
    pub fn new(pool: DbPool, session_hours: u64) -> Self {
        Self {
            pool,
            session_hours,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }
}

/// Inserts the user row. A concurrent registration that wins the race past the
/// pre-check surfaces here as a UNIQUE violation on `email`.
fn insert_user(
    conn: &rusqlite::Connection,
    user_id: &str,
    reg: &Registration,
    hash: &str,
) -> Result<(), AuthError> {
    let inserted = conn.execute(
        "INSERT INTO users (id, email, name, password_hash) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, reg.email, reg.name, hash],
    );
    match inserted {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Err(AuthError::EmailTaken)
        }
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        let reg = registration.normalized()?;
        let conn = self.pool.get()?;

        let taken: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
            params![reg.email],
            |row| row.get(0),
        )?;
        if taken {
            return Err(AuthError::EmailTaken);
        }

        let user_id = uuid::Uuid::now_v7().to_string();
        let hash = bcrypt::hash(&reg.password, self.hash_cost)?;
        insert_user(&conn, &user_id, &reg, &hash)?;
        tracing::info!(user_id = %user_id, "Registered user");

        let access_token = create_session(&self.pool, &user_id, self.session_hours)?;
        Ok(Session {
            user_id,
            access_token,
        })
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let creds = credentials.normalized()?;
        let conn = self.pool.get()?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE email = ?1",
                params![creds.email],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (user_id, hash) = row.ok_or(AuthError::InvalidCredentials)?;
        if !bcrypt::verify(&creds.password, &hash).unwrap_or(false) {
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = create_session(&self.pool, &user_id, self.session_hours)?;
        Ok(Session {
            user_id,
            access_token,
        })
    }

    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        session_user(&self.pool, token)?.ok_or(AuthError::InvalidToken)
    }
}
