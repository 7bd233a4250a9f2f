use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, Statement};

use crate::db::repositories::event::fold_case;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        if !manager.has_column("events", "title_folded").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Events::Table)
                        .add_column(
                            ColumnDef::new(Events::TitleFolded)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_column("events", "description_folded").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Events::Table)
                        .add_column(ColumnDef::new(Events::DescriptionFolded).text().null())
                        .to_owned(),
                )
                .await?;
        }

        if !manager.has_column("events", "location_folded").await? {
            manager
                .alter_table(
                    Table::alter()
                        .table(Events::Table)
                        .add_column(ColumnDef::new(Events::LocationFolded).string().null())
                        .to_owned(),
                )
                .await?;
        }

        // SQLite's lower() and LIKE only fold ASCII, so existing rows are
        // folded here rather than in SQL.
        let conn = manager.get_connection();
        let backend = conn.get_database_backend();
        let rows = conn
            .query_all(Statement::from_string(
                backend,
                "SELECT id, title, description, location_name FROM events",
            ))
            .await?;

        for row in rows {
            let id: i32 = row.try_get("", "id")?;
            let title: String = row.try_get("", "title")?;
            let description: Option<String> = row.try_get("", "description")?;
            let location: Option<String> = row.try_get("", "location_name")?;

            conn.execute(Statement::from_sql_and_values(
                backend,
                "UPDATE events SET title_folded = ?, description_folded = ?, location_folded = ? WHERE id = ?",
                [
                    fold_case(&title).into(),
                    description.as_deref().map(fold_case).into(),
                    location.as_deref().map(fold_case).into(),
                    id.into(),
                ],
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for column in [
            Events::TitleFolded,
            Events::DescriptionFolded,
            Events::LocationFolded,
        ] {
            manager
                .alter_table(
                    Table::alter()
                        .table(Events::Table)
                        .drop_column(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Events {
    Table,
    TitleFolded,
    DescriptionFolded,
    LocationFolded,
}
