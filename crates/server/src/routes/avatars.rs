use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use models::ShopId;

use crate::auth::CallerIdentity;
use crate::errors::ApiError;
use crate::state::AppState;

const IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Stored image bytes, or a bare 404.
pub async fn fetch(State(state): State<AppState>, Path(id): Path<ShopId>) -> Result<Response, ApiError> {
    let Some(object) = state.avatars.fetch(id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    Ok((
        [(header::CONTENT_TYPE, object.content_type), (header::CACHE_CONTROL, IMMUTABLE.to_string())],
        Body::from(object.body),
    )
        .into_response())
}

/// Replace a shop's image with the raw request body. Owner only.
pub async fn upload(
    State(state): State<AppState>,
    CallerIdentity(username): CallerIdentity,
    Path(id): Path<ShopId>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if !state.ledger.owns_shop(&username, id).await? {
        return Err(ApiError::shop_not_found());
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.avatars.upload(id, body.to_vec(), &content_type).await.map_err(|e| match e {
        service::errors::ServiceError::Validation(_) => {
            ApiError::bad_request("invalidAvatar", "Invalid avatar format. Use JPEG, PNG, or WebP.")
        }
        other => other.into(),
    })?;
    let shop = state.ledger.get_shop_as_public(id).await.map_err(ApiError::shop)?;
    Ok(Json(json!({ "shop": shop })))
}
