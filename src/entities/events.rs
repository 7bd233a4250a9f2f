use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub location_name: Option<String>,
    pub image_url: Option<String>,
    pub starts_at: DateTimeUtc,
    pub ends_at: Option<DateTimeUtc>,
    /// One of `draft`, `published`, `cancelled`.
    pub status: String,
    pub created_at: DateTimeUtc,
    /// Lowercased copies of the searchable text, maintained on upsert.
    pub title_folded: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description_folded: Option<String>,
    pub location_folded: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
