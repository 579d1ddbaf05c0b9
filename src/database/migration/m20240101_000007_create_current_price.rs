use sea_orm_migration::prelude::*;

use super::m20240101_000005_create_store_products::StoreProducts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CurrentPrice::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CurrentPrice::StoreProductId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CurrentPrice::Price).decimal_len(10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-current-price-store-product")
                            .from(CurrentPrice::Table, CurrentPrice::StoreProductId)
                            .to(StoreProducts::Table, StoreProducts::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CurrentPrice::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum CurrentPrice {
    Table,
    StoreProductId,
    Price,
}
