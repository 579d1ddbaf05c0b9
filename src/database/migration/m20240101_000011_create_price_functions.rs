use sea_orm_migration::prelude::*;

use super::m20240101_000008_create_promotions::Promotions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PriceFunctions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PriceFunctions::PromotionId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PriceFunctions::Kind).integer().not_null())
                    .col(ColumnDef::new(PriceFunctions::Value).decimal_len(10, 2).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-price-functions-promotion")
                            .from(PriceFunctions::Table, PriceFunctions::PromotionId)
                            .to(Promotions::Table, Promotions::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PriceFunctions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum PriceFunctions {
    Table,
    PromotionId,
    Kind,
    Value,
}
