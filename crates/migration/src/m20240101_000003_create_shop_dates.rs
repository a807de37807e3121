//! Create `shop_dates` day buckets keyed by `(shop_id, date_key)`.
//!
//! `date_key` is epoch seconds at UTC midnight. A bucket with count zero is
//! deleted rather than stored.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ShopDates::Table)
                    .if_not_exists()
                    .col(integer(ShopDates::ShopId))
                    .col(big_integer(ShopDates::DateKey))
                    .col(big_integer(ShopDates::Count))
                    .primary_key(
                        Index::create()
                            .name("pk_shop_dates")
                            .col(ShopDates::ShopId)
                            .col(ShopDates::DateKey),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shop_dates_shop")
                            .from(ShopDates::Table, ShopDates::ShopId)
                            .to(Shops::Table, Shops::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ShopDates::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ShopDates { Table, ShopId, DateKey, Count }

#[derive(DeriveIden)]
enum Shops { Table, Id }
