use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::rate_limiter;
use crate::state::AppState;

pub mod auth;
pub mod avatars;
pub mod shops;
pub mod user;

// multipart framing and the name field on top of the image itself
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api = Router::new()
        .route("/api/auth", post(auth::authenticate))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/user", get(user::me))
        .route("/api/shops", post(shops::create))
        .route("/api/shops/:id", delete(shops::remove))
        .route("/api/shops/:id/increment", post(shops::increment))
        .route("/api/shops/:id/undo", post(shops::undo))
        .route("/api/shops/:id/avatar", put(avatars::upload))
        .route("/api/avatars/:id", get(avatars::fetch))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes + FORM_OVERHEAD_BYTES));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(middleware::from_fn_with_state(state.limiter.clone(), rate_limiter::rate_limit))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
