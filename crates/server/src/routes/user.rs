use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::auth::CallerIdentity;
use crate::errors::ApiError;
use crate::state::AppState;

pub async fn me(State(state): State<AppState>, CallerIdentity(username): CallerIdentity) -> Result<Json<Value>, ApiError> {
    let user = state.ledger.get_public_user(&username).await.map_err(ApiError::account)?;
    Ok(Json(json!({ "user": user })))
}
