//! Administrative commands run from the command line instead of over HTTP.

use albumshelf_catalog::accounts::is_username_char;
use albumshelf_catalog::{
    Accounts, Actor, AlbumInput, Catalog, CatalogError, NewAccount, NewSong, PriceInput,
    TracklistEntry,
};
use albumshelf_db::entities::{album::AlbumFormat, user, user::UserRole};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub const DEFAULT_ARTIST_PASSWORD: &str = "artist123";

/// Username derived from a display name: lowercased, keeping only the
/// characters a username may contain.
pub fn default_username(display_name: &str) -> String {
    display_name
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|&c| is_username_char(c))
        .collect()
}

pub async fn create_user(
    db: &DatabaseConnection,
    display_name: &str,
    username: Option<String>,
    email: Option<String>,
    password: &str,
    role: UserRole,
) -> Result<user::Model, CatalogError> {
    let username = username.unwrap_or_else(|| default_username(display_name));
    let email = email.unwrap_or_else(|| format!("{username}@{role}.example.com"));

    Accounts::new(db)
        .create_account(NewAccount {
            username,
            email,
            display_name: display_name.to_string(),
            password: password.to_string(),
            role,
        })
        .await
}

pub async fn deactivate_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<user::Model, CatalogError> {
    Accounts::new(db).deactivate(username).await
}

struct SeedUser {
    username: &'static str,
    display_name: &'static str,
    password: &'static str,
    role: UserRole,
}

const SEED_USERS: [SeedUser; 3] = [
    SeedUser {
        username: "editor",
        display_name: "Music Editor",
        password: "editor123",
        role: UserRole::Editor,
    },
    SeedUser {
        username: "artist",
        display_name: "The Beatles",
        password: "artist123",
        role: UserRole::Artist,
    },
    SeedUser {
        username: "viewer",
        display_name: "Music Viewer",
        password: "viewer123",
        role: UserRole::Viewer,
    },
];

const SEED_SONGS: [(&str, i64); 3] = [("Come Together", 259), ("Something", 183), ("Time", 413)];

struct SeedAlbum {
    title: &'static str,
    artist: &'static str,
    description: &'static str,
    price: &'static str,
    format: AlbumFormat,
    released: (i32, u32, u32),
    songs: &'static [&'static str],
}

const SEED_ALBUMS: [SeedAlbum; 2] = [
    SeedAlbum {
        title: "Abbey Road",
        artist: "The Beatles",
        description: "The eleventh studio album by the English rock band The Beatles.",
        price: "25.99",
        format: AlbumFormat::Vinyl,
        released: (1969, 9, 26),
        songs: &["Come Together", "Something"],
    },
    SeedAlbum {
        title: "Dark Side of the Moon",
        artist: "Pink Floyd",
        description: "The eighth studio album by the English rock band Pink Floyd.",
        price: "15.99",
        format: AlbumFormat::Cd,
        released: (1973, 3, 1),
        songs: &["Time"],
    },
];

/// What a seed run added. Records that already existed are skipped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub songs: usize,
    pub albums: usize,
}

async fn seed_song(
    catalog: &Catalog<'_>,
    title: &str,
    running_time: i64,
    report: &mut SeedReport,
) -> Result<Uuid, CatalogError> {
    if let Some(song) = catalog.song_by_title(title).await? {
        return Ok(song.id);
    }
    let song = catalog
        .create_song(NewSong::new(title, running_time))
        .await?;
    report.songs += 1;
    Ok(song.id)
}

/// Load sample users, songs and albums. Safe to run repeatedly.
pub async fn seed(db: &DatabaseConnection) -> Result<SeedReport, CatalogError> {
    let mut report = SeedReport::default();
    let accounts = Accounts::new(db);

    let mut editor = None;
    for seed in &SEED_USERS {
        let user = match accounts.find_by_username(seed.username).await? {
            Some(existing) => existing,
            None => {
                let created = accounts
                    .create_account(NewAccount {
                        username: seed.username.to_string(),
                        email: format!("{}@example.com", seed.username),
                        display_name: seed.display_name.to_string(),
                        password: seed.password.to_string(),
                        role: seed.role,
                    })
                    .await?;
                report.users += 1;
                created
            }
        };
        if seed.role == UserRole::Editor {
            editor = Some(Actor::from_user(&user));
        }
    }
    let editor = editor
        .filter(Actor::is_authenticated)
        .ok_or_else(|| CatalogError::PermissionDenied("seed editor account is inactive".into()))?;

    let catalog = Catalog::new(db);
    let mut song_ids = Vec::with_capacity(SEED_SONGS.len());
    for (title, running_time) in SEED_SONGS {
        let id = seed_song(&catalog, title, running_time, &mut report).await?;
        song_ids.push((title, id));
    }

    for seed in &SEED_ALBUMS {
        let (y, m, d) = seed.released;
        let release_date = NaiveDate::from_ymd_opt(y, m, d)
            .ok_or_else(|| CatalogError::validation("release_date", "Enter a valid date."))?;
        let tracklist = seed
            .songs
            .iter()
            .zip(1..)
            .filter_map(|(title, position)| {
                song_ids
                    .iter()
                    .find(|(t, _)| t == title)
                    .map(|(_, id)| TracklistEntry::existing(*id, Some(position)))
            })
            .collect();

        let input = AlbumInput {
            title: seed.title.to_string(),
            artist: seed.artist.to_string(),
            description: seed.description.to_string(),
            price: PriceInput::from(seed.price),
            format: seed.format,
            release_date,
            cover_url: None,
        };
        match catalog.create_album(&editor, input, tracklist).await {
            Ok(_) => report.albums += 1,
            Err(CatalogError::Conflict { .. }) => {
                tracing::debug!(title = seed.title, "seed album already present");
            }
            Err(err) => return Err(err),
        }
    }

    tracing::info!(
        users = report.users,
        songs = report.songs,
        albums = report.albums,
        "seed complete"
    );
    Ok(report)
}
