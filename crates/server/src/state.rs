use std::sync::Arc;
use std::time::Duration;

use common::clock::Clock;
use configs::AppConfig;
use sea_orm::DatabaseConnection;
use service::auth::repo::SeaOrmAuthRepository;
use service::auth::{AuthService, TokenIssuer};
use service::avatar::{AvatarResolver, AvatarService, BlobStore, ExistenceCache};
use service::ledger::repo::SeaOrmLedgerRepository;
use service::ledger::LedgerService;

use crate::rate_limiter::RateLimiter;

#[derive(Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
}

/// Everything a handler needs, shared behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerService<SeaOrmLedgerRepository>>,
    pub auth: Arc<AuthService<SeaOrmAuthRepository>>,
    pub avatars: Arc<AvatarService>,
    pub cache: Arc<ExistenceCache>,
    pub limiter: Arc<RateLimiter>,
    pub cookie: CookieSettings,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        cfg: &AppConfig,
    ) -> Self {
        let cache = Arc::new(ExistenceCache::new(
            store.clone(),
            clock.clone(),
            Duration::from_secs(cfg.avatar.cache_ttl_secs),
        ));
        let resolver = Arc::new(AvatarResolver::new(cache.clone(), &cfg.avatar.public_base));
        let ledger = LedgerService::new(
            Arc::new(SeaOrmLedgerRepository::new(db.clone())),
            resolver,
            clock.clone(),
        );
        let tokens = TokenIssuer::new(&cfg.auth.jwt_secret, Duration::from_secs(cfg.auth.token_ttl_secs));
        let auth = AuthService::new(Arc::new(SeaOrmAuthRepository { db }), tokens, clock);
        let avatars = AvatarService::new(store, cache.clone(), cfg.avatar.max_upload_bytes);

        Self {
            ledger: Arc::new(ledger),
            auth: Arc::new(auth),
            avatars: Arc::new(avatars),
            cache,
            limiter: Arc::new(RateLimiter::from_config(&cfg.rate_limit)),
            cookie: CookieSettings { name: cfg.auth.cookie_name.clone(), secure: cfg.auth.secure_cookie },
            max_upload_bytes: cfg.avatar.max_upload_bytes,
        }
    }
}
