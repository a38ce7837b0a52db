use std::collections::{HashMap, HashSet};

use albumshelf_db::entities::{album, album::AlbumFormat, song, tracklist_item};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{
    sort_tracklist, AlbumChanges, AlbumDetail, AlbumInput, AlbumSummary, Catalog, Page, Paginated,
    TrackEntry, TracklistEntry,
};
use crate::error::{unique_violation, CatalogError, Result};
use crate::policy::{authorize, list_scope, Actor, AlbumAction, ListScope};
use crate::slug::{base_slug, candidate};
use crate::validation::{
    check_position, check_release_date, check_running_time, required_text, MAX_TEXT_LEN,
};

/// Attempts at inserting an album before a concurrent slug collision is
/// reported as a conflict.
pub const MAX_SLUG_ATTEMPTS: u32 = 5;

/// Album columns after validation.
#[derive(Debug, Clone)]
struct AlbumFields {
    title: String,
    artist: String,
    description: String,
    price_cents: i32,
    format: AlbumFormat,
    release_date: NaiveDate,
    cover_url: Option<String>,
}

impl AlbumFields {
    fn from_input(input: AlbumInput, today: NaiveDate) -> Result<Self> {
        check_release_date(input.release_date, today)?;
        Ok(Self {
            title: required_text("title", &input.title)?,
            artist: required_text("artist", &input.artist)?,
            description: input.description.trim().to_string(),
            price_cents: input.price.to_cents()?,
            format: input.format,
            release_date: input.release_date,
            cover_url: cover_url(input.cover_url.as_deref())?,
        })
    }

    fn merge(current: &album::Model, changes: AlbumChanges, today: NaiveDate) -> Result<Self> {
        if let Some(date) = changes.release_date {
            check_release_date(date, today)?;
        }
        Ok(Self {
            title: match changes.title {
                Some(t) => required_text("title", &t)?,
                None => current.title.clone(),
            },
            artist: match changes.artist {
                Some(a) => required_text("artist", &a)?,
                None => current.artist.clone(),
            },
            description: changes
                .description
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| current.description.clone()),
            price_cents: match changes.price {
                Some(p) => p.to_cents()?,
                None => current.price_cents,
            },
            format: changes.format.unwrap_or(current.format),
            release_date: changes.release_date.unwrap_or(current.release_date),
            cover_url: match changes.cover_url {
                Some(url) => cover_url(Some(&url))?,
                None => current.cover_url.clone(),
            },
        })
    }

    fn conflict(&self) -> CatalogError {
        CatalogError::conflict(
            "album",
            "title, artist and format",
            format!("{} by {} ({})", self.title, self.artist, self.format.label()),
        )
    }
}

fn cover_url(raw: Option<&str>) -> Result<Option<String>> {
    let Some(url) = raw.map(str::trim).filter(|u| !u.is_empty()) else {
        return Ok(None);
    };
    if url.chars().count() > MAX_TEXT_LEN {
        return Err(CatalogError::validation(
            "cover_url",
            format!("Ensure this field has no more than {MAX_TEXT_LEN} characters."),
        ));
    }
    Ok(Some(url.to_string()))
}

/// A tracklist row that passed the checks needing no database access.
#[derive(Debug, Clone)]
pub(super) struct PlannedEntry {
    index: usize,
    song: PlannedSong,
    position: Option<i32>,
}

#[derive(Debug, Clone)]
enum PlannedSong {
    Existing(Uuid),
    New { title: String, running_time: i32 },
}

fn entry_field(index: usize, name: &str) -> String {
    format!("tracklist[{index}].{name}")
}

/// Shape checks on a submitted tracklist: one song reference per row,
/// positive positions, valid inline songs, no song listed twice.
pub(super) fn plan_tracklist(entries: &[TracklistEntry]) -> Result<Vec<PlannedEntry>> {
    let mut seen_ids = HashSet::new();
    let mut seen_titles = HashSet::new();
    let mut planned = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        check_position(&entry_field(index, "position"), entry.position)?;

        let song = match (&entry.song_id, &entry.song) {
            (Some(id), None) => {
                if !seen_ids.insert(*id) {
                    return Err(CatalogError::validation(
                        entry_field(index, "song_id"),
                        "This song is already on the tracklist.",
                    ));
                }
                PlannedSong::Existing(*id)
            }
            (None, Some(new)) => {
                let title = required_text(&entry_field(index, "song.title"), &new.title)?;
                let running_time =
                    check_running_time(&entry_field(index, "song.running_time"), new.running_time)?;
                if !seen_titles.insert(title.to_lowercase()) {
                    return Err(CatalogError::validation(
                        entry_field(index, "song.title"),
                        "This song is already on the tracklist.",
                    ));
                }
                PlannedSong::New {
                    title,
                    running_time,
                }
            }
            (Some(_), Some(_)) => {
                return Err(CatalogError::validation(
                    entry_field(index, "song"),
                    "Give either song_id or song, not both.",
                ))
            }
            (None, None) => {
                return Err(CatalogError::validation(
                    entry_field(index, "song_id"),
                    "This field is required.",
                ))
            }
        };

        planned.push(PlannedEntry {
            index,
            song,
            position: entry.position,
        });
    }

    Ok(planned)
}

/// Looks up referenced songs and inserts inline ones, returning
/// `(song_id, position)` pairs in submission order.
pub(super) async fn resolve_tracklist<C: ConnectionTrait>(
    conn: &C,
    planned: &[PlannedEntry],
) -> Result<Vec<(Uuid, Option<i32>)>> {
    let mut resolved: Vec<(Uuid, Option<i32>)> = Vec::with_capacity(planned.len());

    for entry in planned {
        let song_id = match &entry.song {
            PlannedSong::Existing(id) => {
                song::Entity::find_by_id(*id)
                    .one(conn)
                    .await?
                    .ok_or_else(|| {
                        CatalogError::validation(
                            entry_field(entry.index, "song_id"),
                            "Song does not exist.",
                        )
                    })?
                    .id
            }
            PlannedSong::New {
                title,
                running_time,
            } => {
                super::songs::insert_song(conn, title, *running_time, None)
                    .await?
                    .id
            }
        };

        if resolved.iter().any(|(id, _)| *id == song_id) {
            return Err(CatalogError::validation(
                entry_field(entry.index, "song_id"),
                "This song is already on the tracklist.",
            ));
        }
        resolved.push((song_id, entry.position));
    }

    Ok(resolved)
}

/// Replace an album's tracklist with `tracks`, keyed on song identity.
/// Returns the number of rows added, repositioned and removed.
async fn replace_tracklist<C: ConnectionTrait>(
    conn: &C,
    album_id: Uuid,
    tracks: Vec<(Uuid, Option<i32>)>,
) -> Result<(usize, usize, usize)> {
    let mut existing: HashMap<Uuid, tracklist_item::Model> = tracklist_item::Entity::find()
        .filter(tracklist_item::Column::AlbumId.eq(album_id))
        .all(conn)
        .await?
        .into_iter()
        .map(|item| (item.song_id, item))
        .collect();

    let (mut added, mut moved) = (0, 0);
    for (song_id, position) in tracks {
        match existing.remove(&song_id) {
            Some(item) if item.position == position => {}
            Some(item) => {
                let mut active: tracklist_item::ActiveModel = item.into();
                active.position = Set(position);
                active.update(conn).await?;
                moved += 1;
            }
            None => {
                insert_item(conn, album_id, song_id, position).await?;
                added += 1;
            }
        }
    }

    let stale: Vec<Uuid> = existing.into_values().map(|item| item.id).collect();
    let removed = stale.len();
    if !stale.is_empty() {
        tracklist_item::Entity::delete_many()
            .filter(tracklist_item::Column::Id.is_in(stale))
            .exec(conn)
            .await?;
    }

    Ok((added, moved, removed))
}

async fn insert_item<C: ConnectionTrait>(
    conn: &C,
    album_id: Uuid,
    song_id: Uuid,
    position: Option<i32>,
) -> std::result::Result<tracklist_item::Model, DbErr> {
    tracklist_item::ActiveModel {
        id: Set(Uuid::new_v4()),
        album_id: Set(album_id),
        song_id: Set(song_id),
        position: Set(position),
    }
    .insert(conn)
    .await
}

async fn ensure_unique_album<C: ConnectionTrait>(
    conn: &C,
    fields: &AlbumFields,
    exclude: Option<Uuid>,
) -> Result<()> {
    let mut query = album::Entity::find()
        .filter(album::Column::Title.eq(fields.title.as_str()))
        .filter(album::Column::Artist.eq(fields.artist.as_str()))
        .filter(album::Column::Format.eq(fields.format));
    if let Some(id) = exclude {
        query = query.filter(album::Column::Id.ne(id));
    }

    if query.one(conn).await?.is_some() {
        return Err(fields.conflict());
    }
    Ok(())
}

/// First free slug among `base`, `base-1`, `base-2`, ...
async fn free_slug<C: ConnectionTrait>(conn: &C, base: &str) -> Result<String> {
    let mut n = 0;
    loop {
        let slug = candidate(base, n);
        let taken = album::Entity::find()
            .filter(album::Column::Slug.eq(slug.as_str()))
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(slug);
        }
        n += 1;
    }
}

pub(super) async fn load_tracklist<C: ConnectionTrait>(
    conn: &C,
    album_id: Uuid,
) -> Result<Vec<TrackEntry>> {
    let rows = tracklist_item::Entity::find()
        .filter(tracklist_item::Column::AlbumId.eq(album_id))
        .find_also_related(song::Entity)
        .all(conn)
        .await?;

    let mut entries: Vec<TrackEntry> = rows
        .into_iter()
        .filter_map(|(item, song)| song.map(|song| TrackEntry { item, song }))
        .collect();
    sort_tracklist(&mut entries);
    Ok(entries)
}

/// Total running time per album, for a page of albums in one query.
async fn total_playtimes<C: ConnectionTrait>(
    conn: &C,
    album_ids: impl IntoIterator<Item = Uuid>,
) -> Result<HashMap<Uuid, i64>> {
    let ids: Vec<Uuid> = album_ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = tracklist_item::Entity::find()
        .filter(tracklist_item::Column::AlbumId.is_in(ids))
        .find_also_related(song::Entity)
        .all(conn)
        .await?;

    let mut totals = HashMap::new();
    for (item, song) in rows {
        if let Some(song) = song {
            *totals.entry(item.album_id).or_insert(0) += i64::from(song.running_time);
        }
    }
    Ok(totals)
}

/// Insert the album and its tracklist rows, then commit. A slug collision
/// with a concurrent insert rolls back and reports `SlugTaken`; any other
/// uniqueness failure is the (title, artist, format) conflict.
async fn insert_album(
    txn: DatabaseTransaction,
    fields: &AlbumFields,
    tracks: &[(Uuid, Option<i32>)],
    slug: String,
) -> Result<Created> {
    let id = Uuid::new_v4();
    let inserted = album::ActiveModel {
        id: Set(id),
        title: Set(fields.title.clone()),
        artist: Set(fields.artist.clone()),
        description: Set(fields.description.clone()),
        price_cents: Set(fields.price_cents),
        format: Set(fields.format),
        release_date: Set(fields.release_date),
        cover_url: Set(fields.cover_url.clone()),
        slug: Set(slug),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&txn)
    .await;

    if let Err(err) = inserted {
        return match unique_violation(&err) {
            Some(msg) if msg.contains("slug") => {
                txn.rollback().await?;
                Ok(Created::SlugTaken)
            }
            Some(_) => Err(fields.conflict()),
            None => Err(err.into()),
        };
    }

    for &(song_id, position) in tracks {
        insert_item(&txn, id, song_id, position).await?;
    }

    txn.commit().await?;
    Ok(Created::Album(id))
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Debug)]
enum Created {
    Album(Uuid),
    SlugTaken,
}

impl Catalog<'_> {
    /// Albums visible to `actor`, ordered by title.
    pub async fn list_albums(&self, actor: &Actor, page: Page) -> Result<Paginated<AlbumSummary>> {
        authorize(actor, AlbumAction::List, None)?;
        let page = page.clamped();

        let mut query = album::Entity::find();
        if let ListScope::Artist(name) = list_scope(actor) {
            // SQLite's lower() folds ASCII only, so a non-ASCII artist name
            // must match case exactly there. PostgreSQL folds Unicode.
            query = query.filter(
                Expr::expr(Func::lower(Expr::col(album::Column::Artist))).eq(name.to_lowercase()),
            );
        }

        let paginator = query
            .order_by_asc(album::Column::Title)
            .order_by_asc(album::Column::Id)
            .paginate(self.db, page.per_page);
        let total = paginator.num_items().await?;
        let albums = paginator.fetch_page(page.page - 1).await?;
        let playtimes = total_playtimes(self.db, albums.iter().map(|a| a.id)).await?;

        Ok(Paginated::new(
            albums
                .into_iter()
                .map(|a| {
                    let total = playtimes.get(&a.id).copied().unwrap_or_default();
                    AlbumSummary::new(a, total)
                })
                .collect(),
            total,
            page,
        ))
    }

    pub async fn find_album(&self, id: Uuid) -> Result<album::Model> {
        album::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("album", id))
    }

    pub async fn album_detail(&self, id: Uuid) -> Result<AlbumDetail> {
        let album = self.find_album(id).await?;
        let tracklist = load_tracklist(self.db, album.id).await?;
        Ok(AlbumDetail { album, tracklist })
    }

    pub async fn album_detail_by_slug(&self, slug: &str) -> Result<AlbumDetail> {
        let album = album::Entity::find()
            .filter(album::Column::Slug.eq(slug))
            .one(self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("album", slug))?;
        let tracklist = load_tracklist(self.db, album.id).await?;
        Ok(AlbumDetail { album, tracklist })
    }

    /// Create an album with its tracklist. Nothing is persisted unless the
    /// album, every inline song and every tracklist row are written.
    pub async fn create_album(
        &self,
        actor: &Actor,
        input: AlbumInput,
        tracklist: Vec<TracklistEntry>,
    ) -> Result<AlbumDetail> {
        authorize(actor, AlbumAction::Create, None)?;
        let fields = AlbumFields::from_input(input, today())?;
        let planned = plan_tracklist(&tracklist)?;
        let base = base_slug(&fields.title, &fields.artist);

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            match self.try_create(&fields, &planned, &base).await? {
                Created::Album(id) => {
                    tracing::info!(album_id = %id, title = %fields.title, artist = %fields.artist, "album created");
                    return self.album_detail(id).await;
                }
                Created::SlugTaken => {
                    tracing::warn!(attempt, base = %base, "slug taken by a concurrent insert, retrying");
                }
            }
        }

        Err(CatalogError::conflict("album", "slug", base))
    }

    async fn try_create(
        &self,
        fields: &AlbumFields,
        planned: &[PlannedEntry],
        base: &str,
    ) -> Result<Created> {
        let txn = self.db.begin().await?;

        ensure_unique_album(&txn, fields, None).await?;
        let tracks = resolve_tracklist(&txn, planned).await?;
        let slug = free_slug(&txn, base).await?;
        insert_album(txn, fields, &tracks, slug).await
    }

    /// Apply `changes` to an album. The slug is kept as first assigned.
    /// When `tracklist` is given it replaces the stored one.
    pub async fn update_album(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: AlbumChanges,
        tracklist: Option<Vec<TracklistEntry>>,
    ) -> Result<AlbumDetail> {
        let current = self.find_album(id).await?;
        authorize(actor, AlbumAction::Edit, Some(&current))?;

        let fields = AlbumFields::merge(&current, changes, today())?;
        let planned = tracklist.as_deref().map(plan_tracklist).transpose()?;

        let txn = self.db.begin().await?;
        ensure_unique_album(&txn, &fields, Some(id)).await?;

        let mut active: album::ActiveModel = current.into();
        active.title = Set(fields.title.clone());
        active.artist = Set(fields.artist.clone());
        active.description = Set(fields.description.clone());
        active.price_cents = Set(fields.price_cents);
        active.format = Set(fields.format);
        active.release_date = Set(fields.release_date);
        active.cover_url = Set(fields.cover_url.clone());
        active.update(&txn).await.map_err(|err| match unique_violation(&err) {
            Some(_) => fields.conflict(),
            None => err.into(),
        })?;

        if let Some(planned) = planned {
            let tracks = resolve_tracklist(&txn, &planned).await?;
            let (added, moved, removed) = replace_tracklist(&txn, id, tracks).await?;
            tracing::debug!(album_id = %id, added, moved, removed, "tracklist replaced");
        }

        txn.commit().await?;
        tracing::info!(album_id = %id, "album updated");
        self.album_detail(id).await
    }

    pub async fn delete_album(&self, actor: &Actor, id: Uuid) -> Result<()> {
        let album = self.find_album(id).await?;
        authorize(actor, AlbumAction::Delete, Some(&album))?;

        let txn = self.db.begin().await?;
        tracklist_item::Entity::delete_many()
            .filter(tracklist_item::Column::AlbumId.eq(id))
            .exec(&txn)
            .await?;
        album::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(album_id = %id, title = %album.title, "album deleted");
        Ok(())
    }
}
