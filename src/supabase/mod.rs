//! Hosted backend: Supabase auth, PostgREST tables and object storage,
//! all reached over one timed-out `reqwest::Client`.

mod auth;
mod rest;
mod storage;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Deserializer};

use crate::config::SupabaseConfig;

pub const TRACING_TARGET: &str = "beerlog::supabase";

struct Inner {
    http: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url)
            .field("bucket", &self.inner.bucket)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> anyhow::Result<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("supabase.url is not set"))?;
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("supabase.api_key is not set"))?;

        Self::with_timeout(
            url,
            api_key,
            &config.bucket,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn with_timeout(
        url: &str,
        api_key: &str,
        bucket: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let parsed = url::Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("supabase url must be http(s), got {url}");
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("beerlog/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::info!(
            target: TRACING_TARGET,
            url = %parsed,
            timeout_ms = timeout.as_millis() as u64,
            "Supabase client created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: parsed.as_str().trim_end_matches('/').to_string(),
                api_key: api_key.to_string(),
                bucket: bucket.to_string(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.inner.base_url, path.trim_start_matches('/'))
    }

    /// A request carrying the project key as both `apikey` and bearer.
    fn service(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.endpoint(path))
            .header("apikey", &self.inner.api_key)
            .bearer_auth(&self.inner.api_key)
    }

    /// A request made on behalf of the holder of `token`.
    fn as_user(&self, method: reqwest::Method, path: &str, token: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, self.endpoint(path))
            .header("apikey", &self.inner.api_key)
            .bearer_auth(token)
    }
}

/// Status and body of a non-2xx response.
#[derive(Debug)]
struct Failure {
    status: StatusCode,
    message: String,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Splits a response into success or a readable `Failure`.
async fn classify(response: Response) -> Result<Result<Response, Failure>, reqwest::Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(Ok(response));
    }
    let text = response.text().await?;
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body
        .msg
        .or(body.message)
        .or(body.error_description)
        .or(body.error)
        .unwrap_or(text);
    Ok(Err(Failure { status, message }))
}

/// Accepts RFC 3339 timestamps and zone-less ones (taken as UTC).
fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp {raw:?}")))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
