// Shared fixtures for catalog integration tests
#![allow(dead_code)]

use albumshelf_catalog::{Actor, AlbumInput, PriceInput};
use albumshelf_db::entities::{album::AlbumFormat, user::UserRole};
use albumshelf_db::{connect, DatabaseConfig};
use albumshelf_migration::{Migrator, MigratorTrait};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Fresh in-memory SQLite database with all migrations applied.
pub async fn test_db() -> DatabaseConnection {
    let db = connect(&DatabaseConfig::single("sqlite::memory:"))
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub fn editor() -> Actor {
    Actor::new(Uuid::new_v4(), "Music Editor", UserRole::Editor)
}

pub fn artist(name: &str) -> Actor {
    Actor::new(Uuid::new_v4(), name, UserRole::Artist)
}

pub fn viewer() -> Actor {
    Actor::new(Uuid::new_v4(), "Music Fan", UserRole::Viewer)
}

pub fn album_input(title: &str, artist: &str, format: AlbumFormat) -> AlbumInput {
    AlbumInput {
        title: title.to_string(),
        artist: artist.to_string(),
        description: String::new(),
        price: PriceInput::from("19.99"),
        format,
        release_date: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
        cover_url: None,
    }
}

pub fn abbey_road() -> AlbumInput {
    AlbumInput {
        description: "The eleventh studio album by the English rock band the Beatles.".to_string(),
        price: PriceInput::from("25.99"),
        release_date: NaiveDate::from_ymd_opt(1969, 9, 26).unwrap(),
        ..album_input("Abbey Road", "The Beatles", AlbumFormat::Vinyl)
    }
}
