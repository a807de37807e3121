use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Shops: lookups are always owner-scoped
        manager
            .create_index(
                Index::create()
                    .name("idx_shops_username")
                    .table(Shops::Table)
                    .col(Shops::Username)
                    .to_owned(),
            )
            .await?;

        // ShopDates: date range scans for charts
        manager
            .create_index(
                Index::create()
                    .name("idx_shop_dates_date_key")
                    .table(ShopDates::Table)
                    .col(ShopDates::DateKey)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_shops_username").table(Shops::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_shop_dates_date_key").table(ShopDates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Shops { Table, Username }

#[derive(DeriveIden)]
enum ShopDates { Table, DateKey }
