use sea_orm_migration::prelude::*;

use super::m20240101_000004_create_items::Items;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StoreProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StoreProducts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StoreProducts::ItemId).big_integer())
                    .col(ColumnDef::new(StoreProducts::StoreId).integer().not_null())
                    .col(ColumnDef::new(StoreProducts::Code).big_integer().not_null())
                    .col(ColumnDef::new(StoreProducts::External).boolean().not_null())
                    .col(ColumnDef::new(StoreProducts::Name).text().not_null())
                    .col(
                        ColumnDef::new(StoreProducts::Quantity)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(StoreProducts::Unit)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-store-products-store")
                            .from(StoreProducts::Table, StoreProducts::StoreId)
                            .to(
                                super::m20240101_000003_create_stores::Stores::Table,
                                super::m20240101_000003_create_stores::Stores::Id,
                            ),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-store-products-item")
                            .from(StoreProducts::Table, StoreProducts::ItemId)
                            .to(Items::Table, Items::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-store-products-store-id-code")
                    .table(StoreProducts::Table)
                    .col(StoreProducts::StoreId)
                    .col(StoreProducts::Code)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StoreProducts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum StoreProducts {
    Table,
    Id,
    ItemId,
    StoreId,
    Code,
    External,
    Name,
    Quantity,
    Unit,
}
