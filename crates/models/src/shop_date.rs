use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shop;

/// One day bucket: how many events a shop logged on `date_key`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop_dates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub shop_id: shop::ShopId,
    #[sea_orm(primary_key, auto_increment = false)]
    pub date_key: i64,
    pub count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Shop,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Shop => Entity::belongs_to(shop::Entity)
                .from(Column::ShopId)
                .to(shop::Column::Id)
                .into(),
        }
    }
}

impl Related<shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
