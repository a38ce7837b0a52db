pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_albums;
mod m20240101_000003_create_songs;
mod m20240101_000004_create_tracklist_items;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_albums::Migration),
            Box::new(m20240101_000003_create_songs::Migration),
            Box::new(m20240101_000004_create_tracklist_items::Migration),
        ]
    }
}
