use sea_orm_migration::prelude::*;

use super::m20240101_000003_create_stores::Stores;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Promotions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Promotions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Promotions::StoreId).integer().not_null())
                    .col(
                        ColumnDef::new(Promotions::InternalPromotionCode)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Promotions::Description).text().not_null())
                    .col(ColumnDef::new(Promotions::StartDate).date().not_null())
                    .col(ColumnDef::new(Promotions::EndDate).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-promotions-store")
                            .from(Promotions::Table, Promotions::StoreId)
                            .to(Stores::Table, Stores::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-promotions-store-id-internal-promotion-code")
                    .table(Promotions::Table)
                    .col(Promotions::StoreId)
                    .col(Promotions::InternalPromotionCode)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Promotions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Promotions {
    Table,
    Id,
    StoreId,
    InternalPromotionCode,
    Description,
    StartDate,
    EndDate,
}
