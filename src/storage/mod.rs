pub mod local;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rejected by object store: {0}")]
    Rejected(String),
}

/// An image received from a client, before it is stored.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub data: Bytes,
}

/// Object storage for post images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `data` under `key` and return a publicly fetchable URL.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<String, StorageError>;
}

/// Builds a collision-free object key of the form `<author>/<uuid>.<ext>`.
/// Only the extension of the client filename is kept.
pub fn storage_key(author_id: &str, filename: Option<&str>) -> String {
    let author: String = author_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let author = if author.is_empty() { "anonymous".to_string() } else { author };
    let id = uuid::Uuid::new_v4().simple();

    match filename.and_then(extension) {
        Some(ext) => format!("{author}/{id}.{ext}"),
        None => format!("{author}/{id}"),
    }
}

fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

pub fn content_type_for(filename: Option<&str>) -> String {
    filename
        .map(|f| mime_guess::from_path(f).first_or_octet_stream())
        .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM)
        .to_string()
}

/// Stores an uploaded image and returns its URL. A missing, empty or failed
/// upload yields `placeholder_url` so the post can still be created.
pub async fn intake(
    store: &dyn ImageStore,
    author_id: &str,
    upload: Option<ImageUpload>,
    placeholder_url: &str,
) -> String {
    let Some(upload) = upload.filter(|u| !u.data.is_empty()) else {
        return placeholder_url.to_string();
    };

    let key = storage_key(author_id, upload.filename.as_deref());
    let content_type = content_type_for(upload.filename.as_deref());

    match store.put(&key, upload.data, &content_type).await {
        Ok(url) => {
            tracing::info!(key = %key, content_type = %content_type, "Stored beer image");
            url
        }
        Err(e) => {
            tracing::warn!(key = %key, "Image upload failed, using placeholder: {}", e);
            placeholder_url.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const PLACEHOLDER: &str = "https://placeholder.test/beer.png";

    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ImageStore for RecordingStore {
        async fn put(&self, key: &str, _data: Bytes, content_type: &str) -> Result<String, StorageError> {
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok(format!("https://cdn.test/{key}"))
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ImageStore for FailingStore {
        async fn put(&self, _key: &str, _data: Bytes, _ct: &str) -> Result<String, StorageError> {
            Err(StorageError::Rejected("bucket not found".into()))
        }
    }

    fn upload(name: &str) -> Option<ImageUpload> {
        Some(ImageUpload {
            filename: Some(name.to_string()),
            data: Bytes::from_static(b"\x89PNG"),
        })
    }

    #[test]
    fn storage_key_keeps_only_extension() {
        let key = storage_key("user-1", Some("../../etc/My Beer.JPG"));
        assert!(key.starts_with("user-1/"));
        assert!(key.ends_with(".jpg"));
        assert!(!key.contains(".."));
        assert!(!key.contains(' '));
    }

    #[test]
    fn storage_keys_do_not_collide() {
        assert_ne!(
            storage_key("u", Some("beer.png")),
            storage_key("u", Some("beer.png"))
        );
    }

    #[test]
    fn storage_key_without_extension() {
        let key = storage_key("u", Some("beer"));
        assert_eq!(key.len(), "u/".len() + 32);
    }

    #[test]
    fn content_type_is_inferred_from_extension() {
        assert_eq!(content_type_for(Some("a.png")), "image/png");
        assert_eq!(content_type_for(Some("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(None), "application/octet-stream");
    }

    #[tokio::test]
    async fn intake_returns_store_url() {
        let store = RecordingStore::default();
        let url = intake(&store, "u1", upload("pint.png"), PLACEHOLDER).await;
        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].1, "image/png");
        assert_eq!(url, format!("https://cdn.test/{}", puts[0].0));
    }

    #[tokio::test]
    async fn intake_falls_back_to_placeholder_on_failure() {
        let url = intake(&FailingStore, "u1", upload("pint.png"), PLACEHOLDER).await;
        assert_eq!(url, PLACEHOLDER);
    }

    #[tokio::test]
    async fn intake_without_image_uses_placeholder() {
        let store = RecordingStore::default();
        assert_eq!(intake(&store, "u1", None, PLACEHOLDER).await, PLACEHOLDER);
        let empty = Some(ImageUpload {
            filename: Some("x.png".into()),
            data: Bytes::new(),
        });
        assert_eq!(intake(&store, "u1", empty, PLACEHOLDER).await, PLACEHOLDER);
        assert!(store.puts.lock().unwrap().is_empty());
    }
}
