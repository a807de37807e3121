use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::{errors, shop_date, user};

pub type ShopId = i32;

pub const NAME_MAX_LEN: usize = 100;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: ShopId,
    pub username: String,
    pub name: String,
    pub total: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::Username)
                .to(user::Column::Username)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<shop_date::Entity> for Entity {
    fn to() -> RelationDef {
        shop_date::Relation::Shop.def().rev()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Trimmed name, 1..=100 characters.
pub fn validate_name(name: &str) -> Result<String, errors::ModelError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(errors::ModelError::Validation("shop name required".into()));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(errors::ModelError::Validation(format!(
            "shop name must be at most {NAME_MAX_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Insert a shop with a zero total. The name is stored as given.
pub async fn create<C: ConnectionTrait>(db: &C, username: &str, name: &str) -> Result<Model, errors::ModelError> {
    let am = ActiveModel {
        username: Set(username.to_string()),
        name: Set(name.to_string()),
        total: Set(0),
        ..Default::default()
    };
    Ok(am.insert(db).await?)
}
