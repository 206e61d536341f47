use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::{ImageStore, StorageError};

/// Writes images under a directory on disk; they are served back by
/// `routes::uploads`.
pub struct LocalImageStore {
    root: PathBuf,
    base_url: String,
}

impl LocalImageStore {
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Joins a relative key under `root`, refusing anything that would escape it.
pub fn resolve(root: &Path, key: &str) -> Option<PathBuf> {
    let rel = Path::new(key);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(rel))
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<String, StorageError> {
        let path = resolve(&self.root, key)
            .ok_or_else(|| StorageError::Rejected(format!("invalid key {key:?}")))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        Ok(format!("{}/{}", self.base_url, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_writes_file_and_returns_url() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(tmp.path().to_path_buf(), "http://localhost:8000/uploads/".into());

        let url = store
            .put("u1/abc.png", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8000/uploads/u1/abc.png");
        let written = std::fs::read(tmp.path().join("u1/abc.png")).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn put_rejects_escaping_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(tmp.path().to_path_buf(), "http://x".into());
        let err = store
            .put("../evil.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Rejected(_)));
    }

    #[test]
    fn resolve_rejects_absolute_and_parent_paths() {
        let root = Path::new("/srv/uploads");
        assert!(resolve(root, "/etc/passwd").is_none());
        assert!(resolve(root, "a/../../b").is_none());
        assert_eq!(resolve(root, "a/b.png").unwrap(), root.join("a/b.png"));
    }
}
