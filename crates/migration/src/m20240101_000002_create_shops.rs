//! Create `shops` table with FK to `users`.
//!
//! `total` is the all-time count and must equal the sum of the shop's
//! `shop_dates` rows.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shops::Table)
                    .if_not_exists()
                    .col(pk_auto(Shops::Id))
                    .col(string_len(Shops::Username, 64))
                    .col(string_len(Shops::Name, 100))
                    .col(big_integer(Shops::Total).default(0))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shops_user")
                            .from(Shops::Table, Shops::Username)
                            .to(Users::Table, Users::Username)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Shops::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Shops { Table, Id, Username, Name, Total }

#[derive(DeriveIden)]
enum Users { Table, Username }
