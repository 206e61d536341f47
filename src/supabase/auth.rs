use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{classify, Failure, SupabaseClient, TRACING_TARGET};
use crate::auth::{AuthError, Credentials, IdentityProvider, Registration};
use crate::db::models::Session;

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

/// Body of `/auth/v1/signup` and `/auth/v1/token`. Sign-up without
/// auto-confirm returns the bare user instead of a session.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
    id: Option<String>,
}

impl AuthResponse {
    fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str()).or(self.id.as_deref())
    }

    fn into_session(self) -> Option<Session> {
        let user_id = self.user_id()?.to_string();
        Some(Session {
            user_id,
            access_token: self.access_token?,
        })
    }
}

fn signup_failure(failure: Failure) -> AuthError {
    let lowered = failure.message.to_lowercase();
    if lowered.contains("already registered") || lowered.contains("already exists") {
        return AuthError::EmailTaken;
    }
    match failure.status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            AuthError::Validation(failure.message)
        }
        status => AuthError::Provider(format!("signup returned {status}: {}", failure.message)),
    }
}

fn login_failure(failure: Failure) -> AuthError {
    if failure.status.is_client_error() {
        return AuthError::InvalidCredentials;
    }
    AuthError::Provider(format!(
        "token grant returned {}: {}",
        failure.status, failure.message
    ))
}

fn verify_failure(failure: Failure) -> AuthError {
    if failure.status.is_client_error() {
        return AuthError::InvalidToken;
    }
    AuthError::Provider(format!(
        "user lookup returned {}: {}",
        failure.status, failure.message
    ))
}

impl SupabaseClient {
    async fn password_grant(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .service(Method::POST, "auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let body: AuthResponse = classify(response).await?.map_err(login_failure)?.json().await?;
        body.into_session().ok_or(AuthError::InvalidCredentials)
    }

    async fn insert_profile(&self, session: &Session, reg: &Registration) -> Result<(), AuthError> {
        let response = self
            .as_user(Method::POST, "rest/v1/users", &session.access_token)
            .header("Prefer", "return=minimal")
            .json(&json!({ "id": session.user_id, "email": reg.email, "name": reg.name }))
            .send()
            .await?;

        if let Err(failure) = classify(response).await? {
            return Err(AuthError::Provider(format!(
                "profile insert returned {}: {}",
                failure.status, failure.message
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for SupabaseClient {
    async fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        let reg = registration.normalized()?;

        let response = self
            .service(Method::POST, "auth/v1/signup")
            .json(&json!({
                "email": reg.email,
                "password": reg.password,
                "data": { "name": reg.name },
            }))
            .send()
            .await?;
        let body: AuthResponse = classify(response).await?.map_err(signup_failure)?.json().await?;

        let session = match body.into_session() {
            Some(session) => session,
            // No session on sign-up: try signing straight in.
            None => self
                .password_grant(&reg.email, &reg.password)
                .await
                .map_err(|e| match e {
                    AuthError::InvalidCredentials => AuthError::Validation(
                        "Account created; confirm your email before logging in".into(),
                    ),
                    other => other,
                })?,
        };

        self.insert_profile(&session, &reg).await?;
        tracing::info!(target: TRACING_TARGET, user_id = %session.user_id, "Registered user");
        Ok(session)
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let creds = credentials.normalized()?;
        self.password_grant(&creds.email, &creds.password).await
    }

    async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let response = self.as_user(Method::GET, "auth/v1/user", token).send().await?;
        let user: AuthUser = classify(response).await?.map_err(verify_failure)?.json().await?;
        Ok(user.id)
    }
}
