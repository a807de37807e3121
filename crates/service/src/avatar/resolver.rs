use std::sync::Arc;

use models::ShopId;

use super::cache::ExistenceCache;

pub const DEFAULT_PUBLIC_BASE: &str = "/api/avatars";

/// Decides which avatar URL, if any, to report for a shop.
///
/// Never touches the relational store. `None` tells the client to fall back
/// to its placeholder image.
pub struct AvatarResolver {
    cache: Arc<ExistenceCache>,
    public_base: String,
}

impl AvatarResolver {
    pub fn new(cache: Arc<ExistenceCache>, public_base: &str) -> Self {
        Self { cache, public_base: public_base.trim_end_matches('/').to_string() }
    }

    pub async fn resolve(&self, shop_id: ShopId) -> Option<String> {
        if self.cache.check_exists(shop_id).await {
            Some(self.public_url(shop_id))
        } else {
            None
        }
    }

    pub fn public_url(&self, shop_id: ShopId) -> String {
        format!("{}/{}", self.public_base, shop_id)
    }

    pub fn cache(&self) -> &Arc<ExistenceCache> {
        &self.cache
    }
}
