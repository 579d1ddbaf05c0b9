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
                    .table(PriceHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PriceHistory::StoreProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PriceHistory::StartDate).date().not_null())
                    .col(ColumnDef::new(PriceHistory::EndDate).date())
                    .col(ColumnDef::new(PriceHistory::Price).decimal_len(10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-price-history-store-product")
                            .from(PriceHistory::Table, PriceHistory::StoreProductId)
                            .to(StoreProducts::Table, StoreProducts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-price-history-store-product-id-start-date")
                    .table(PriceHistory::Table)
                    .col(PriceHistory::StoreProductId)
                    .col(PriceHistory::StartDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-price-history-open-intervals")
                    .table(PriceHistory::Table)
                    .col(PriceHistory::StoreProductId)
                    .col(PriceHistory::EndDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriceHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum PriceHistory {
    Table,
    Id,
    StoreProductId,
    StartDate,
    EndDate,
    Price,
}
