use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chains::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chains::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Chains::FullId).big_integer().not_null())
                    .col(ColumnDef::new(Chains::SubchainId).integer())
                    .col(ColumnDef::new(Chains::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-chains-full-id-subchain-id")
                    .table(Chains::Table)
                    .col(Chains::FullId)
                    .col(Chains::SubchainId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Chains::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Chains {
    Table,
    Id,
    FullId,
    SubchainId,
    Name,
}
