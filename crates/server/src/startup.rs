use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::clock::{Clock, SystemClock};
use common::utils::logging::init_logging;
use configs::{AppConfig, AvatarConfig, BlobStoreKind};
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::avatar::cache::spawn_sweeper;
use service::avatar::http::HttpBlobStore;
use service::avatar::local::LocalBlobStore;
use service::avatar::BlobStore;

use crate::rate_limiter;
use crate::routes;
use crate::state::AppState;

const LIMITER_SWEEP_EVERY: Duration = Duration::from_secs(60);

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

async fn build_blob_store(cfg: &AvatarConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    Ok(match cfg.store {
        BlobStoreKind::Local => {
            common::env::ensure_data_dir(&cfg.dir).await?;
            Arc::new(LocalBlobStore::new(&cfg.dir))
        }
        BlobStoreKind::Http => Arc::new(HttpBlobStore::new(&cfg.endpoint, cfg.bearer_token.clone())),
    })
}

/// Wire config, database, blob store and router into a ready application.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<(Router, AppState)> {
    let store = build_blob_store(&cfg.avatar).await?;

    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.auto_migrate {
        models::db::migrate(&db).await?;
        info!("migrations applied");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(db, store, clock, cfg);
    let app = routes::build_router(state.clone(), build_cors());
    Ok((app, state))
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate()?;
    init_logging(cfg.log.json);

    let (app, state) = build_app(&cfg).await?;
    if cfg.avatar.sweep_interval_secs > 0 {
        spawn_sweeper(state.cache.clone(), Duration::from_secs(cfg.avatar.sweep_interval_secs));
    }
    if cfg.rate_limit.enabled {
        rate_limiter::spawn_sweeper(state.limiter.clone(), LIMITER_SWEEP_EVERY);
    }

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, store = ?cfg.avatar.store, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
