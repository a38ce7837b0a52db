use albumshelf_db::entities::{song, tracklist_item};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use super::{Catalog, NewSong, Page, Paginated, SongChanges};
use crate::error::{CatalogError, Result};
use crate::validation::{check_running_time, required_text};

/// Song with the same title, ignoring case, other than `exclude`.
async fn find_by_title<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    exclude: Option<Uuid>,
) -> Result<Option<song::Model>> {
    // ASCII-only case folding on SQLite; Unicode on PostgreSQL.
    let mut query = song::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(song::Column::Title))).eq(title.to_lowercase()));
    if let Some(id) = exclude {
        query = query.filter(song::Column::Id.ne(id));
    }
    Ok(query.one(conn).await?)
}

/// Insert a validated song, rejecting a title already in use.
pub(super) async fn insert_song<C: ConnectionTrait>(
    conn: &C,
    title: &str,
    running_time: i32,
    exclude: Option<Uuid>,
) -> Result<song::Model> {
    if find_by_title(conn, title, exclude).await?.is_some() {
        return Err(CatalogError::conflict("song", "title", title));
    }

    let song = song::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(title.to_string()),
        running_time: Set(running_time),
    }
    .insert(conn)
    .await?;

    tracing::debug!(song_id = %song.id, title = %song.title, "song created");
    Ok(song)
}

impl Catalog<'_> {
    pub async fn create_song(&self, new: NewSong) -> Result<song::Model> {
        let title = required_text("title", &new.title)?;
        let running_time = check_running_time("running_time", new.running_time)?;
        insert_song(self.db, &title, running_time, None).await
    }

    pub async fn list_songs(&self, page: Page) -> Result<Paginated<song::Model>> {
        let page = page.clamped();
        let paginator = song::Entity::find()
            .order_by_asc(song::Column::Title)
            .order_by_asc(song::Column::Id)
            .paginate(self.db, page.per_page);
        let total = paginator.num_items().await?;
        let songs = paginator.fetch_page(page.page - 1).await?;
        Ok(Paginated::new(songs, total, page))
    }

    /// Song with this title, ignoring case.
    pub async fn song_by_title(&self, title: &str) -> Result<Option<song::Model>> {
        find_by_title(self.db, title.trim(), None).await
    }

    pub async fn song(&self, id: Uuid) -> Result<song::Model> {
        song::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("song", id))
    }

    pub async fn update_song(&self, id: Uuid, changes: SongChanges) -> Result<song::Model> {
        let current = self.song(id).await?;

        let title = match changes.title {
            Some(t) => required_text("title", &t)?,
            None => current.title.clone(),
        };
        let running_time = match changes.running_time {
            Some(seconds) => check_running_time("running_time", seconds)?,
            None => current.running_time,
        };

        if find_by_title(self.db, &title, Some(id)).await?.is_some() {
            return Err(CatalogError::conflict("song", "title", title));
        }

        let mut active: song::ActiveModel = current.into();
        active.title = Set(title);
        active.running_time = Set(running_time);
        Ok(active.update(self.db).await?)
    }

    /// Delete a song and every tracklist row referencing it.
    pub async fn delete_song(&self, id: Uuid) -> Result<()> {
        self.song(id).await?;

        let txn = self.db.begin().await?;
        tracklist_item::Entity::delete_many()
            .filter(tracklist_item::Column::SongId.eq(id))
            .exec(&txn)
            .await?;
        song::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(song_id = %id, "song deleted");
        Ok(())
    }
}
