#![cfg(test)]
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::clock::ManualClock;
use configs::DatabaseConfig;
use sea_orm::DatabaseConnection;

use crate::avatar::blob::mock::MemoryBlobStore;
use crate::avatar::cache::{ExistenceCache, DEFAULT_TTL};
use crate::avatar::resolver::{AvatarResolver, DEFAULT_PUBLIC_BASE};
use crate::ledger::repo::SeaOrmLedgerRepository;
use crate::ledger::LedgerService;

// Each test gets its own migrated in-memory database.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    models::db::connect_in_memory().await
}

/// Migrated SQLite file with a real pool, so transactions can overlap.
pub async fn get_pooled_db(max_connections: u32) -> Result<(DatabaseConnection, PathBuf), anyhow::Error> {
    let path = std::env::temp_dir().join(format!("boba-ledger-{}.db", uuid::Uuid::new_v4()));
    let cfg = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections,
        min_connections: 1,
        ..Default::default()
    };
    let db = models::db::connect_with_config(&cfg).await?;
    models::db::migrate(&db).await?;
    Ok((db, path))
}

pub fn noon(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub struct Fixture {
    pub db: DatabaseConnection,
    pub store: Arc<MemoryBlobStore>,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<ExistenceCache>,
    pub ledger: LedgerService<SeaOrmLedgerRepository>,
}

impl Fixture {
    pub async fn new() -> Result<Self, anyhow::Error> {
        Ok(Self::on(get_db().await?))
    }

    pub fn on(db: DatabaseConnection) -> Self {
        let store = Arc::new(MemoryBlobStore::default());
        let clock = Arc::new(ManualClock::new(noon(2024, 6, 1)));
        let cache = Arc::new(ExistenceCache::new(store.clone(), clock.clone(), DEFAULT_TTL));
        let resolver = Arc::new(AvatarResolver::new(cache.clone(), DEFAULT_PUBLIC_BASE));
        let repo = Arc::new(SeaOrmLedgerRepository::new(db.clone()));
        let ledger = LedgerService::new(repo, resolver, clock.clone());
        Self { db, store, clock, cache, ledger }
    }

    pub async fn with_users(names: &[&str]) -> Result<Self, anyhow::Error> {
        let fx = Self::new().await?;
        fx.add_users(names).await?;
        Ok(fx)
    }

    pub async fn add_users(&self, names: &[&str]) -> Result<(), anyhow::Error> {
        for name in names {
            models::user::create(&self.db, name, "$argon2id$placeholder", 0).await?;
        }
        Ok(())
    }
}
