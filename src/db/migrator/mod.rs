use sea_orm_migration::prelude::*;

mod m20260301_add_expansion_cache;
mod m20260301_create_events;
mod m20260305_add_folded_search_columns;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_create_events::Migration),
            Box::new(m20260301_add_expansion_cache::Migration),
            Box::new(m20260305_add_folded_search_columns::Migration),
        ]
    }
}
