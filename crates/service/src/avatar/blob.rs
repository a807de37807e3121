use async_trait::async_trait;
use models::ShopId;
use thiserror::Error;

/// Business errors for blob storage
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("remote store error: {0}")]
    Remote(String),
    #[error("unexpected status {status} for {key}")]
    Status { status: u16, key: String },
}

/// A stored image and its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// One object per shop, addressed by [`avatar_key`].
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Existence check without fetching the body.
    async fn head(&self, key: &str) -> Result<bool, BlobError>;
    async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError>;
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BlobError>;
    /// Deleting a missing object is not an error.
    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

pub fn avatar_key(shop_id: ShopId) -> String {
    format!("{shop_id}.webp")
}

/// In-memory store for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryBlobStore {
        objects: Mutex<HashMap<String, BlobObject>>,
        head_calls: AtomicUsize,
        fail_head: AtomicBool,
        fail_delete: AtomicBool,
    }

    impl MemoryBlobStore {
        /// Number of `head` calls served so far, failed ones included.
        pub fn head_calls(&self) -> usize {
            self.head_calls.load(Ordering::SeqCst)
        }

        pub fn set_fail_head(&self, fail: bool) {
            self.fail_head.store(fail, Ordering::SeqCst);
        }

        pub fn set_fail_delete(&self, fail: bool) {
            self.fail_delete.store(fail, Ordering::SeqCst);
        }

        /// Place an object directly, bypassing any cache bookkeeping.
        pub fn seed(&self, key: &str, body: &[u8], content_type: &str) {
            let obj = BlobObject { body: body.to_vec(), content_type: content_type.to_string() };
            self.objects.lock().unwrap().insert(key.to_string(), obj);
        }

        pub fn contains(&self, key: &str) -> bool {
            self.objects.lock().unwrap().contains_key(key)
        }
    }

    #[async_trait]
    impl BlobStore for MemoryBlobStore {
        async fn head(&self, key: &str) -> Result<bool, BlobError> {
            self.head_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_head.load(Ordering::SeqCst) {
                return Err(BlobError::Remote("head unavailable".into()));
            }
            Ok(self.contains(key))
        }

        async fn get(&self, key: &str) -> Result<Option<BlobObject>, BlobError> {
            Ok(self.objects.lock().unwrap().get(key).cloned())
        }

        async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
            let obj = BlobObject { body, content_type: content_type.to_string() };
            self.objects.lock().unwrap().insert(key.to_string(), obj);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), BlobError> {
            if self.fail_delete.load(Ordering::SeqCst) {
                return Err(BlobError::Remote("delete unavailable".into()));
            }
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MemoryBlobStore;
    use super::*;

    #[test]
    fn key_follows_shop_id() {
        assert_eq!(avatar_key(42), "42.webp");
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryBlobStore::default();
        assert!(!store.head("1.webp").await.unwrap());
        store.put("1.webp", vec![1, 2, 3], "image/webp").await.unwrap();
        assert!(store.head("1.webp").await.unwrap());
        let obj = store.get("1.webp").await.unwrap().unwrap();
        assert_eq!(obj.content_type, "image/webp");
        store.delete("1.webp").await.unwrap();
        store.delete("1.webp").await.unwrap();
        assert!(store.get("1.webp").await.unwrap().is_none());
        assert_eq!(store.head_calls(), 2);
    }
}
