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
                    .table(WebAccess::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(WebAccess::ChainId).integer().not_null().primary_key())
                    .col(ColumnDef::new(WebAccess::Url).string().not_null())
                    .col(
                        ColumnDef::new(WebAccess::Username)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(WebAccess::Password)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-web-access-chain")
                            .from(WebAccess::Table, WebAccess::ChainId)
                            .to(Chains::Table, Chains::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WebAccess::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum WebAccess {
    Table,
    ChainId,
    Url,
    Username,
    Password,
}
