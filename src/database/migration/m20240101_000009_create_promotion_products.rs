use sea_orm_migration::prelude::*;

use super::{
    m20240101_000005_create_store_products::StoreProducts,
    m20240101_000008_create_promotions::Promotions,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PromotionProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PromotionProducts::PromotionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PromotionProducts::StoreProductId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(PromotionProducts::PromotionId)
                            .col(PromotionProducts::StoreProductId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-promotion-products-promotion")
                            .from(PromotionProducts::Table, PromotionProducts::PromotionId)
                            .to(Promotions::Table, Promotions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-promotion-products-store-product")
                            .from(PromotionProducts::Table, PromotionProducts::StoreProductId)
                            .to(StoreProducts::Table, StoreProducts::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PromotionProducts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum PromotionProducts {
    Table,
    PromotionId,
    StoreProductId,
}
