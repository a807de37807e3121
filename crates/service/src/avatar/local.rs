//! Disk-backed blob store for single-node deployments and development.
//!
//! Each object is a file named after its key, with the media type kept in a
//! `<key>.type` sidecar.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use super::blob::{BlobError, BlobObject, BlobStore};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, BlobError> {
        let safe = !key.is_empty()
            && !key.starts_with('.')
            && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if !safe {
            return Err(BlobError::Remote(format!("invalid object key {key:?}")));
        }
        Ok(self.root.join(key))
    }

    fn type_path(&self, key: &str) -> Result<PathBuf, BlobError> {
        let mut name = self.object_path(key)?.into_os_string();
        name.push(".type");
        Ok(PathBuf::from(name))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn head(&self, key: &str) -> Result<bool, BlobError> {
        match tokio::fs::metadata(self.object_path(key)?).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError> {
        let body = match tokio::fs::read(self.object_path(key)?).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let content_type = match tokio::fs::read_to_string(self.type_path(key)?).await {
            Ok(t) => t.trim().to_string(),
            Err(e) if e.kind() == ErrorKind::NotFound => DEFAULT_CONTENT_TYPE.to_string(),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(BlobObject { body, content_type }))
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        let path = self.object_path(key)?;
        tokio::fs::create_dir_all(&self.root).await?;
        // write-then-rename so readers never see a half-written image
        let tmp = path.with_extension("partial");
        tokio::fs::write(&tmp, &body).await?;
        tokio::fs::write(self.type_path(key)?, content_type).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(%key, bytes = body.len(), "blob stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        for path in [self.object_path(key)?, self.type_path(key)?] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("boba-blobs-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn stores_and_removes_objects() -> anyhow::Result<()> {
        let dir = scratch_dir();
        let store = LocalBlobStore::new(&dir);

        assert!(!store.head("7.webp").await?);
        assert!(store.get("7.webp").await?.is_none());

        store.put("7.webp", b"RIFFxxxxWEBP".to_vec(), "image/webp").await?;
        assert!(store.head("7.webp").await?);
        let obj = store.get("7.webp").await?.expect("stored object");
        assert_eq!(obj.body, b"RIFFxxxxWEBP");
        assert_eq!(obj.content_type, "image/webp");

        store.delete("7.webp").await?;
        assert!(!store.head("7.webp").await?);
        // second delete is a no-op
        store.delete("7.webp").await?;

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let store = LocalBlobStore::new(scratch_dir());
        assert!(store.head("../etc/passwd").await.is_err());
        assert!(store.put(".hidden", vec![], "image/png").await.is_err());
    }
}
