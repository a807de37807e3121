use std::sync::Arc;

use models::ShopId;
use tracing::{error, info, instrument};

use super::blob::{avatar_key, BlobObject, BlobStore};
use super::cache::ExistenceCache;
use crate::errors::ServiceError;

pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/webp", "image/png", "image/jpeg"];

/// Write path for shop images: keeps the existence cache in step with the
/// blob store on upload and delete.
pub struct AvatarService {
    store: Arc<dyn BlobStore>,
    cache: Arc<ExistenceCache>,
    max_bytes: usize,
}

impl AvatarService {
    pub fn new(store: Arc<dyn BlobStore>, cache: Arc<ExistenceCache>, max_bytes: usize) -> Self {
        Self { store, cache, max_bytes }
    }

    /// Validate the payload without storing anything.
    pub fn validate(&self, body: &[u8], content_type: &str) -> Result<(), ServiceError> {
        if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
            return Err(ServiceError::Validation("invalid avatar format; use JPEG, PNG, or WebP".into()));
        }
        if body.is_empty() {
            return Err(ServiceError::Validation("avatar is empty".into()));
        }
        if body.len() > self.max_bytes {
            return Err(ServiceError::Validation(format!("avatar exceeds {} bytes", self.max_bytes)));
        }
        Ok(())
    }

    #[instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn upload(&self, shop_id: ShopId, body: Vec<u8>, content_type: &str) -> Result<(), ServiceError> {
        self.validate(&body, content_type)?;
        self.store.put(&avatar_key(shop_id), body, content_type).await?;
        self.cache.record_uploaded(shop_id);
        info!(shop_id, %content_type, "avatar_uploaded");
        Ok(())
    }

    /// Delete the image. The cache entry is dropped even if the store call
    /// fails, so a later read re-checks rather than trusting "exists".
    #[instrument(skip(self))]
    pub async fn remove(&self, shop_id: ShopId) -> Result<(), ServiceError> {
        let res = self.store.delete(&avatar_key(shop_id)).await;
        self.cache.invalidate(shop_id);
        match res {
            Ok(()) => {
                info!(shop_id, "avatar_removed");
                Ok(())
            }
            Err(e) => {
                error!(shop_id, error = %e, "avatar delete failed");
                Err(e.into())
            }
        }
    }

    pub async fn fetch(&self, shop_id: ShopId) -> Result<Option<BlobObject>, ServiceError> {
        Ok(self.store.get(&avatar_key(shop_id)).await?)
    }
}
