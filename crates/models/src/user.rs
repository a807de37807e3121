use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::errors;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    /// Epoch seconds.
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 64;

/// Usernames are stored trimmed and lowercased.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_username(username: &str) -> Result<(), errors::ModelError> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN {
        return Err(errors::ModelError::Validation(format!(
            "username must be at least {USERNAME_MIN_LEN} characters"
        )));
    }
    if len > USERNAME_MAX_LEN {
        return Err(errors::ModelError::Validation(format!(
            "username must be at most {USERNAME_MAX_LEN} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(errors::ModelError::Validation("username must not contain spaces".into()));
    }
    Ok(())
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    username: &str,
    hashed_password: &str,
    created_at: i64,
) -> Result<Model, errors::ModelError> {
    let username = normalize_username(username);
    validate_username(&username)?;
    let am = ActiveModel {
        username: Set(username),
        hashed_password: Set(hashed_password.to_string()),
        created_at: Set(created_at),
    };
    Ok(am.insert(db).await?)
}

pub async fn find<C: ConnectionTrait>(db: &C, username: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find_by_id(normalize_username(username)).one(db).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_padding() {
        assert_eq!(normalize_username("  Alice "), "alice");
    }

    #[test]
    fn rejects_short_or_spaced_names() {
        assert!(validate_username("al").is_err());
        assert!(validate_username("al ice").is_err());
        assert!(validate_username(&"x".repeat(USERNAME_MAX_LEN + 1)).is_err());
        assert!(validate_username("alice").is_ok());
    }

    #[test]
    fn password_hash_never_serialized() {
        let m = Model { username: "alice".into(), hashed_password: "secret".into(), created_at: 1 };
        let v = serde_json::to_value(&m).unwrap();
        assert!(v.get("hashed_password").is_none());
        assert_eq!(v["username"], "alice");
    }
}
