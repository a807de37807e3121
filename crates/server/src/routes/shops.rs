use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use models::ShopId;

use crate::auth::CallerIdentity;
use crate::errors::ApiError;
use crate::state::AppState;

struct Upload {
    body: Vec<u8>,
    content_type: String,
}

/// Multipart form: `name`, plus an optional `avatar` image.
pub async fn create(
    State(state): State<AppState>,
    CallerIdentity(username): CallerIdentity,
    mut form: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut name = None;
    let mut avatar = None;
    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request("invalidForm", e.to_string()))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => {
                let text = field.text().await.map_err(|e| ApiError::bad_request("invalidForm", e.to_string()))?;
                name = Some(text);
            }
            Some("avatar") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let body = field.bytes().await.map_err(|e| ApiError::bad_request("invalidForm", e.to_string()))?;
                if !body.is_empty() {
                    avatar = Some(Upload { body: body.to_vec(), content_type });
                }
            }
            _ => {}
        }
    }

    let name = models::shop::validate_name(name.as_deref().unwrap_or_default())
        .map_err(|_| ApiError::bad_request("shopNameRequired", "Shop name must be 1-100 characters."))?;
    if let Some(upload) = &avatar {
        state
            .avatars
            .validate(&upload.body, &upload.content_type)
            .map_err(|_| ApiError::bad_request("invalidAvatar", "Invalid avatar format. Use JPEG, PNG, or WebP."))?;
    }

    let shop = state.ledger.add_shop(&username, &name).await?;
    let Some(upload) = avatar else {
        return Ok(Json(json!({ "shop": shop })));
    };

    if let Err(e) = state.avatars.upload(shop.id, upload.body, &upload.content_type).await {
        // no half-created shops: drop the row the image was meant for
        if let Err(undo) = state.ledger.delete_shop(&username, shop.id).await {
            warn!(shop_id = shop.id, error = %undo, "could not roll back shop after failed avatar upload");
        }
        return Err(ApiError::internal(e));
    }
    let shop = state.ledger.get_shop_as_public(shop.id).await.map_err(ApiError::shop)?;
    Ok(Json(json!({ "shop": shop })))
}

/// Ledger delete first; the image is removed best-effort afterwards.
pub async fn remove(
    State(state): State<AppState>,
    CallerIdentity(username): CallerIdentity,
    Path(id): Path<ShopId>,
) -> Result<Json<Value>, ApiError> {
    if !state.ledger.delete_shop(&username, id).await? {
        return Err(ApiError::shop_not_found());
    }
    if state.avatars.remove(id).await.is_err() {
        info!(shop_id = id, "shop deleted; avatar left for cleanup");
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn increment(
    State(state): State<AppState>,
    CallerIdentity(username): CallerIdentity,
    Path(id): Path<ShopId>,
) -> Result<Json<Value>, ApiError> {
    let shop = state.ledger.increment_shop(&username, id).await.map_err(ApiError::shop)?;
    Ok(Json(json!({ "shop": shop })))
}

pub async fn undo(
    State(state): State<AppState>,
    CallerIdentity(username): CallerIdentity,
    Path(id): Path<ShopId>,
) -> Result<Json<Value>, ApiError> {
    let shop = state.ledger.undo_shop_increment(&username, id).await.map_err(ApiError::shop)?;
    Ok(Json(json!({ "shop": shop })))
}
