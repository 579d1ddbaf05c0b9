use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_chains::Chains;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stores::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Stores::StoreId).integer().not_null())
                    .col(ColumnDef::new(Stores::ChainId).integer().not_null())
                    .col(ColumnDef::new(Stores::Name).string().not_null())
                    .col(ColumnDef::new(Stores::City).string().not_null())
                    .col(
                        ColumnDef::new(Stores::Address)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Stores::StoreType)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stores-chain")
                            .from(Stores::Table, Stores::ChainId)
                            .to(Chains::Table, Chains::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-stores-chain-id-store-id")
                    .table(Stores::Table)
                    .col(Stores::ChainId)
                    .col(Stores::StoreId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stores::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Stores {
    Table,
    Id,
    StoreId,
    ChainId,
    Name,
    City,
    Address,
    StoreType,
}
