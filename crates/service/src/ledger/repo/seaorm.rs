use async_trait::async_trait;
use models::{shop, shop_date, user, DayKey, ShopId};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::errors::ServiceError;
use crate::ledger::domain::{ShopRecord, UndoOutcome, UserRecord};
use crate::ledger::repository::LedgerRepository;

/// SQL-backed ledger. Each mutation runs in one transaction built from
/// conditional statements; the affected-row counts decide the outcome.
///
/// Nothing here reads through `self.db` while a transaction is open: with a
/// single-connection pool that would wait on itself.
pub struct SeaOrmLedgerRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmLedgerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn owned(shop_id: ShopId, username: &str) -> sea_orm::Condition {
    sea_orm::Condition::all()
        .add(shop::Column::Id.eq(shop_id))
        .add(shop::Column::Username.eq(username))
}

#[async_trait]
impl LedgerRepository for SeaOrmLedgerRepository {
    async fn insert_shop(&self, username: &str, name: &str) -> Result<ShopRecord, ServiceError> {
        let created = shop::create(&self.db, username, name).await?;
        Ok(ShopRecord::from_parts(created, Vec::new()))
    }

    async fn increment(&self, username: &str, shop_id: ShopId, day: DayKey) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;

        let bumped = shop::Entity::update_many()
            .col_expr(shop::Column::Total, Expr::col(shop::Column::Total).add(1))
            .filter(owned(shop_id, username))
            .exec(&txn)
            .await?;
        if bumped.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }

        let bucket = shop_date::ActiveModel {
            shop_id: Set(shop_id),
            date_key: Set(day.as_secs()),
            count: Set(1),
        };
        shop_date::Entity::insert(bucket)
            .on_conflict(
                OnConflict::columns([shop_date::Column::ShopId, shop_date::Column::DateKey])
                    .value(
                        shop_date::Column::Count,
                        Expr::col((shop_date::Entity, shop_date::Column::Count)).add(1),
                    )
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;

        txn.commit().await?;
        Ok(true)
    }

    async fn undo(&self, username: &str, shop_id: ShopId, day: DayKey) -> Result<UndoOutcome, ServiceError> {
        let txn = self.db.begin().await?;

        let dropped = shop::Entity::update_many()
            .col_expr(shop::Column::Total, Expr::col(shop::Column::Total).sub(1))
            .filter(owned(shop_id, username))
            .filter(shop::Column::Total.gt(0))
            .exec(&txn)
            .await?;
        if dropped.rows_affected == 0 {
            txn.rollback().await?;
            // zero rows: either not ours, or already at zero
            return if self.is_owner(username, shop_id).await? {
                Ok(UndoOutcome::NoOp)
            } else {
                Ok(UndoOutcome::NotFound)
            };
        }

        let in_bucket = sea_orm::Condition::all()
            .add(shop_date::Column::ShopId.eq(shop_id))
            .add(shop_date::Column::DateKey.eq(day.as_secs()));

        let decremented = shop_date::Entity::update_many()
            .col_expr(shop_date::Column::Count, Expr::col(shop_date::Column::Count).sub(1))
            .filter(in_bucket.clone())
            .filter(shop_date::Column::Count.gt(1))
            .exec(&txn)
            .await?;
        if decremented.rows_affected == 0 {
            // last event of the day: the bucket goes away instead of reaching zero
            let removed = shop_date::Entity::delete_many().filter(in_bucket).exec(&txn).await?;
            if removed.rows_affected == 0 {
                // nothing logged today; leave the total alone so it keeps matching the buckets
                txn.rollback().await?;
                return Ok(UndoOutcome::NoOp);
            }
        }

        txn.commit().await?;
        Ok(UndoOutcome::Undone)
    }

    async fn delete_shop(&self, username: &str, shop_id: ShopId) -> Result<bool, ServiceError> {
        let txn = self.db.begin().await?;
        let removed = shop::Entity::delete_many().filter(owned(shop_id, username)).exec(&txn).await?;
        if removed.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(false);
        }
        shop_date::Entity::delete_many()
            .filter(shop_date::Column::ShopId.eq(shop_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(true)
    }

    async fn is_owner(&self, username: &str, shop_id: ShopId) -> Result<bool, ServiceError> {
        let n = shop::Entity::find().filter(owned(shop_id, username)).count(&self.db).await?;
        Ok(n > 0)
    }

    async fn load_shop(&self, shop_id: ShopId) -> Result<Option<ShopRecord>, ServiceError> {
        let rows = shop::Entity::find()
            .filter(shop::Column::Id.eq(shop_id))
            .find_with_related(shop_date::Entity)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().next().map(|(s, dates)| ShopRecord::from_parts(s, dates)))
    }

    async fn load_user(&self, username: &str) -> Result<Option<UserRecord>, ServiceError> {
        let Some(owner) = user::find(&self.db, username).await? else {
            return Ok(None);
        };
        let shops = shop::Entity::find()
            .filter(shop::Column::Username.eq(owner.username.clone()))
            .order_by_asc(shop::Column::Id)
            .find_with_related(shop_date::Entity)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(s, dates)| ShopRecord::from_parts(s, dates))
            .collect();
        Ok(Some(UserRecord::new(owner, shops)))
    }
}
