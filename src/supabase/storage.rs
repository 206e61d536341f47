use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;

use super::{classify, SupabaseClient};
use crate::storage::{ImageStore, StorageError};

impl SupabaseClient {
    pub fn public_url(&self, key: &str) -> String {
        self.endpoint(&format!(
            "storage/v1/object/public/{}/{}",
            self.inner.bucket, key
        ))
    }
}

#[async_trait]
impl ImageStore for SupabaseClient {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String, StorageError> {
        let path = format!("storage/v1/object/{}/{}", self.inner.bucket, key);
        let response = self
            .service(Method::POST, &path)
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;

        if let Err(failure) = classify(response).await? {
            return Err(StorageError::Rejected(format!(
                "{}: {}",
                failure.status, failure.message
            )));
        }

        Ok(self.public_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn public_url_points_at_bucket() {
        let client = SupabaseClient::with_timeout(
            "https://abc.supabase.co",
            "k",
            "beer-images",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.public_url("u1/x.png"),
            "https://abc.supabase.co/storage/v1/object/public/beer-images/u1/x.png"
        );
    }
}
