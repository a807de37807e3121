//! TTL cache answering "does shop X have a custom image".
//!
//! Fronts the blob store's existence check so a shop read costs at most one
//! remote round trip per TTL window. Entries expire lazily: a stale entry is
//! simply refetched and overwritten on the next lookup. The cache is never a
//! source of truth; losing it only costs extra round trips.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use common::clock::Clock;
use dashmap::DashMap;
use models::ShopId;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::blob::{avatar_key, BlobStore};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy)]
struct Entry {
    exists: bool,
    expires_at: DateTime<Utc>,
}

pub struct ExistenceCache {
    entries: DashMap<ShopId, Entry>,
    store: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
}

impl ExistenceCache {
    pub fn new(store: Arc<dyn BlobStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(300));
        Self { entries: DashMap::new(), store, clock, ttl }
    }

    /// Cached answer while fresh; otherwise a remote check whose result is
    /// kept for one TTL. A failed check counts as "absent" for the full TTL.
    pub async fn check_exists(&self, shop_id: ShopId) -> bool {
        let now = self.clock.now();
        if let Some(exists) = self.fresh(shop_id, now) {
            return exists;
        }

        let exists = match self.store.head(&avatar_key(shop_id)).await {
            Ok(exists) => exists,
            Err(e) => {
                warn!(shop_id, error = %e, "avatar existence check failed; caching as absent");
                false
            }
        };
        debug!(shop_id, exists, "avatar existence refreshed");

        let fetched = Entry { exists, expires_at: now + self.ttl };
        // An entry written while the check was in flight (an upload, or a
        // concurrent refresh) is at least as recent as ours and wins.
        self.entries
            .entry(shop_id)
            .and_modify(|e| {
                if e.expires_at <= now {
                    *e = fetched;
                }
            })
            .or_insert(fetched);
        exists
    }

    /// Upload succeeded: the image is visible immediately, whatever was cached.
    pub fn record_uploaded(&self, shop_id: ShopId) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(shop_id, Entry { exists: true, expires_at });
    }

    /// Image deleted: drop the entry so the next read asks the store again.
    pub fn invalidate(&self, shop_id: ShopId) {
        self.entries.remove(&shop_id);
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fresh(&self, shop_id: ShopId, now: DateTime<Utc>) -> Option<bool> {
        self.entries
            .get(&shop_id)
            .filter(|e| now < e.expires_at)
            .map(|e| e.exists)
    }
}

/// Periodically purge expired entries so long-lived processes do not keep
/// one entry for every shop ever read.
pub fn spawn_sweeper(cache: Arc<ExistenceCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // first tick fires immediately
        tick.tick().await;
        loop {
            tick.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = cache.len(), "avatar cache swept");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::avatar::blob::mock::MemoryBlobStore;
    use chrono::TimeZone;
    use common::clock::ManualClock;

    fn setup() -> (Arc<MemoryBlobStore>, Arc<ManualClock>, ExistenceCache) {
        let store = Arc::new(MemoryBlobStore::default());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()));
        let cache = ExistenceCache::new(store.clone(), clock.clone(), DEFAULT_TTL);
        (store, clock, cache)
    }

    #[tokio::test]
    async fn hit_within_ttl_skips_remote() {
        let (store, clock, cache) = setup();
        store.seed("1.webp", b"img", "image/webp");

        assert!(cache.check_exists(1).await);
        clock.advance(chrono::Duration::seconds(299));
        assert!(cache.check_exists(1).await);
        assert_eq!(store.head_calls(), 1);
    }

    #[tokio::test]
    async fn refetches_after_expiry() {
        let (store, clock, cache) = setup();
        assert!(!cache.check_exists(1).await);

        store.seed("1.webp", b"img", "image/webp");
        // still inside the window: stale "absent" is served
        assert!(!cache.check_exists(1).await);

        clock.advance(chrono::Duration::seconds(300));
        assert!(cache.check_exists(1).await);
        assert_eq!(store.head_calls(), 2);
    }

    #[tokio::test]
    async fn failed_check_is_cached_as_absent() {
        let (store, clock, cache) = setup();
        store.seed("1.webp", b"img", "image/webp");
        store.set_fail_head(true);

        assert!(!cache.check_exists(1).await);
        store.set_fail_head(false);
        assert!(!cache.check_exists(1).await);
        assert_eq!(store.head_calls(), 1);

        clock.advance(chrono::Duration::minutes(5));
        assert!(cache.check_exists(1).await);
    }

    #[tokio::test]
    async fn upload_overrides_cached_absence() {
        let (store, _clock, cache) = setup();
        assert!(!cache.check_exists(1).await);

        cache.record_uploaded(1);
        assert!(cache.check_exists(1).await);
        assert_eq!(store.head_calls(), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_fresh_check() {
        let (store, _clock, cache) = setup();
        cache.record_uploaded(1);
        assert!(cache.check_exists(1).await);
        assert_eq!(store.head_calls(), 0);

        cache.invalidate(1);
        assert!(!cache.check_exists(1).await);
        assert_eq!(store.head_calls(), 1);
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let (_store, clock, cache) = setup();
        cache.record_uploaded(1);
        clock.advance(chrono::Duration::minutes(3));
        cache.record_uploaded(2);
        clock.advance(chrono::Duration::minutes(3));

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.check_exists(2).await);
    }
}
