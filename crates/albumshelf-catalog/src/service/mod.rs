//! Catalog operations over albums, songs and tracklists.
//!
//! Every multi-row write runs inside a single transaction. Authorization is
//! checked against the stored album before anything is written.

mod albums;
mod songs;
mod tracklist;

use albumshelf_db::entities::{album, album::AlbumFormat, song, song::format_duration, tracklist_item};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::validation::PriceInput;

pub use albums::MAX_SLUG_ATTEMPTS;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

/// Entry point for catalog operations, borrowing the connection pool.
#[derive(Clone, Copy)]
pub struct Catalog<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> Catalog<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }
}

/// 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub per_page: u64,
}

impl Page {
    /// Clamp raw query values: page at least 1, per_page in 1..=100.
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    /// Same clamping for a `Page` built field by field.
    pub fn clamped(self) -> Self {
        Self::new(Some(self.page), Some(self.per_page))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    fn new(data: Vec<T>, total: u64, page: Page) -> Self {
        Self {
            data,
            total,
            page: page.page,
            per_page: page.per_page,
            total_pages: total.div_ceil(page.per_page),
        }
    }
}

/// Full album payload, as submitted on create or full update.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumInput {
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub description: String,
    pub price: PriceInput,
    pub format: AlbumFormat,
    pub release_date: NaiveDate,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// Partial album update. Absent fields are left untouched; an empty
/// `cover_url` clears the cover.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumChanges {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub format: Option<AlbumFormat>,
    pub release_date: Option<NaiveDate>,
    pub cover_url: Option<String>,
}

impl From<AlbumInput> for AlbumChanges {
    fn from(input: AlbumInput) -> Self {
        Self {
            title: Some(input.title),
            artist: Some(input.artist),
            description: Some(input.description),
            price: Some(input.price),
            format: Some(input.format),
            release_date: Some(input.release_date),
            cover_url: Some(input.cover_url.unwrap_or_default()),
        }
    }
}

/// One row of a submitted tracklist: either an existing song by id or a
/// new song created alongside the album.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TracklistEntry {
    #[serde(default)]
    pub song_id: Option<Uuid>,
    #[serde(default)]
    pub song: Option<NewSong>,
    #[serde(default)]
    pub position: Option<i32>,
}

impl TracklistEntry {
    pub fn existing(song_id: Uuid, position: Option<i32>) -> Self {
        Self {
            song_id: Some(song_id),
            song: None,
            position,
        }
    }

    pub fn new_song(song: NewSong, position: Option<i32>) -> Self {
        Self {
            song_id: None,
            song: Some(song),
            position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSong {
    pub title: String,
    pub running_time: i64,
}

impl NewSong {
    pub fn new(title: impl Into<String>, running_time: i64) -> Self {
        Self {
            title: title.into(),
            running_time,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongChanges {
    pub title: Option<String>,
    pub running_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTracklistItem {
    pub album_id: Uuid,
    pub song_id: Uuid,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TracklistItemChanges {
    pub album_id: Option<Uuid>,
    pub song_id: Option<Uuid>,
    /// `Some(None)` clears the position; `None` leaves it untouched.
    #[serde(default, deserialize_with = "present")]
    pub position: Option<Option<i32>>,
}

/// Distinguishes an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// A tracklist row joined with its song.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    pub item: tracklist_item::Model,
    pub song: song::Model,
}

#[derive(Debug, Clone)]
pub struct AlbumDetail {
    pub album: album::Model,
    /// Ordered by position ascending, unpositioned entries last.
    pub tracklist: Vec<TrackEntry>,
}

impl AlbumDetail {
    /// Sum of the tracklist's running times, in seconds.
    pub fn total_playtime(&self) -> i64 {
        self.tracklist
            .iter()
            .map(|t| i64::from(t.song.running_time))
            .sum()
    }

    pub fn formatted_playtime(&self) -> String {
        format_duration(self.total_playtime())
    }
}

/// Listing row for an album.
#[derive(Debug, Clone, Serialize)]
pub struct AlbumSummary {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub slug: String,
    pub format: AlbumFormat,
    pub format_label: &'static str,
    pub price: String,
    pub release_date: NaiveDate,
    pub release_year: i32,
    pub short_description: String,
    pub cover_url: Option<String>,
    /// Seconds, summed over the tracklist.
    pub total_playtime: i64,
}

impl AlbumSummary {
    pub fn new(a: album::Model, total_playtime: i64) -> Self {
        Self {
            total_playtime,
            short_description: a.short_description(),
            release_year: a.release_year(),
            price: a.price_display(),
            format_label: a.format.label(),
            id: a.id,
            title: a.title,
            artist: a.artist,
            slug: a.slug,
            format: a.format,
            release_date: a.release_date,
            cover_url: a.cover_url,
        }
    }
}

/// Tracklist order: position ascending with unpositioned rows last, then
/// song title.
fn sort_tracklist(entries: &mut [TrackEntry]) {
    entries.sort_by(|a, b| {
        position_key(a.item.position)
            .cmp(&position_key(b.item.position))
            .then_with(|| a.song.title.cmp(&b.song.title))
    });
}

fn position_key(position: Option<i32>) -> (bool, i32) {
    (position.is_none(), position.unwrap_or_default())
}
