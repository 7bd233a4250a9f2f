use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ExpansionCache::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpansionCache::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpansionCache::Query)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ExpansionCache::TermsJson).text().not_null())
                    .col(
                        ColumnDef::new(ExpansionCache::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ExpansionCache::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expansion_cache_expires_at")
                    .table(ExpansionCache::Table)
                    .col(ExpansionCache::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ExpansionCache::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ExpansionCache {
    Table,
    Id,
    Query,
    TermsJson,
    CreatedAt,
    ExpiresAt,
}
