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
                    .table(Restrictions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restrictions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Restrictions::PromotionId).big_integer().not_null())
                    .col(ColumnDef::new(Restrictions::Kind).integer().not_null())
                    .col(ColumnDef::new(Restrictions::Amount).integer())
                    .col(ColumnDef::new(Restrictions::StoreProductId).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-restrictions-promotion")
                            .from(Restrictions::Table, Restrictions::PromotionId)
                            .to(Promotions::Table, Promotions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-restrictions-store-product")
                            .from(Restrictions::Table, Restrictions::StoreProductId)
                            .to(StoreProducts::Table, StoreProducts::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Restrictions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Restrictions {
    Table,
    Id,
    PromotionId,
    Kind,
    Amount,
    StoreProductId,
}
