pub mod local;
pub mod session;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::db::models::Session;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or malformed bearer credential")]
    MissingCredential,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    #[error("email already registered")]
    EmailTaken,

    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider error: {0}")]
    Provider(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Registration {
    /// Trims fields, lower-cases the email and rejects blanks.
    pub fn normalized(&self) -> Result<Self, AuthError> {
        let reg = Self {
            email: normalize_email(&self.email),
            password: self.password.clone(),
            name: self.name.trim().to_string(),
        };
        if reg.email.is_empty() || reg.password.is_empty() || reg.name.is_empty() {
            return Err(AuthError::Validation("Missing required fields".into()));
        }
        Ok(reg)
    }
}

impl Credentials {
    pub fn normalized(&self) -> Result<Self, AuthError> {
        let creds = Self {
            email: normalize_email(&self.email),
            password: self.password.clone(),
        };
        if creds.email.is_empty() || creds.password.is_empty() {
            return Err(AuthError::Validation("Missing email or password".into()));
        }
        Ok(creds)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Resolves bearer credentials into user ids. Implementations verify tokens
/// against whatever issued them; payloads are never trusted unverified.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and issue a bearer credential for it.
    async fn register(&self, registration: &Registration) -> Result<Session, AuthError>;

    /// Exchange email and password for a bearer credential.
    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Resolve a bearer credential to the id of the user it was issued to.
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingCredential)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingCredential)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_strips_prefix() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
    }

    #[test]
    fn bearer_token_rejects_missing_and_malformed() {
        assert!(matches!(bearer_token(None), Err(AuthError::MissingCredential)));
        assert!(matches!(
            bearer_token(Some("Token abc")),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            bearer_token(Some("Bearer   ")),
            Err(AuthError::MissingCredential)
        ));
    }

    #[test]
    fn registration_requires_every_field() {
        let reg = Registration {
            email: "a@b.c".into(),
            password: "hunter2".into(),
            name: "   ".into(),
        };
        assert!(matches!(reg.normalized(), Err(AuthError::Validation(_))));
    }

    #[test]
    fn registration_normalizes_email() {
        let reg = Registration {
            email: "  Alice@Example.COM ".into(),
            password: "hunter2".into(),
            name: " Alice ".into(),
        }
        .normalized()
        .unwrap();
        assert_eq!(reg.email, "alice@example.com");
        assert_eq!(reg.name, "Alice");
    }

    #[test]
    fn credentials_require_password() {
        let creds = Credentials {
            email: "a@b.c".into(),
            password: String::new(),
        };
        assert!(creds.normalized().is_err());
    }
}
