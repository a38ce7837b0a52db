use albumshelf_db::entities::{album, song, tracklist_item};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{sort_tracklist, Catalog, NewTracklistItem, TrackEntry, TracklistItemChanges};
use crate::error::{unique_violation, CatalogError, Result};
use crate::validation::check_position;

fn duplicate_item(song: &song::Model) -> CatalogError {
    CatalogError::conflict("tracklist item", "album and song", song.title.clone())
}

impl Catalog<'_> {
    async fn album_ref(&self, id: Uuid) -> Result<album::Model> {
        album::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| CatalogError::validation("album_id", "Album does not exist."))
    }

    async fn song_ref(&self, id: Uuid) -> Result<song::Model> {
        song::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| CatalogError::validation("song_id", "Song does not exist."))
    }

    async fn pair_taken(&self, album_id: Uuid, song_id: Uuid, exclude: Option<Uuid>) -> Result<bool> {
        let mut query = tracklist_item::Entity::find()
            .filter(tracklist_item::Column::AlbumId.eq(album_id))
            .filter(tracklist_item::Column::SongId.eq(song_id));
        if let Some(id) = exclude {
            query = query.filter(tracklist_item::Column::Id.ne(id));
        }
        Ok(query.one(self.db).await?.is_some())
    }

    /// Tracklist rows, optionally for one album, in tracklist order.
    pub async fn list_tracklist_items(
        &self,
        album_id: Option<Uuid>,
    ) -> Result<Vec<tracklist_item::Model>> {
        let mut query = tracklist_item::Entity::find();
        if let Some(id) = album_id {
            query = query.filter(tracklist_item::Column::AlbumId.eq(id));
        }

        let mut entries: Vec<TrackEntry> = query
            .find_also_related(song::Entity)
            .all(self.db)
            .await?
            .into_iter()
            .filter_map(|(item, song)| song.map(|song| TrackEntry { item, song }))
            .collect();
        // Group by album first so a global listing stays readable.
        entries.sort_by_key(|e| e.item.album_id);
        entries
            .chunk_by_mut(|a, b| a.item.album_id == b.item.album_id)
            .for_each(sort_tracklist);

        Ok(entries.into_iter().map(|e| e.item).collect())
    }

    pub async fn tracklist_item(&self, id: Uuid) -> Result<tracklist_item::Model> {
        tracklist_item::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("tracklist item", id))
    }

    pub async fn add_tracklist_item(&self, new: NewTracklistItem) -> Result<tracklist_item::Model> {
        check_position("position", new.position)?;
        let album = self.album_ref(new.album_id).await?;
        let song = self.song_ref(new.song_id).await?;
        if self.pair_taken(album.id, song.id, None).await? {
            return Err(duplicate_item(&song));
        }

        let item = tracklist_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            album_id: Set(album.id),
            song_id: Set(song.id),
            position: Set(new.position),
        }
        .insert(self.db)
        .await
        .map_err(|err| match unique_violation(&err) {
            Some(_) => duplicate_item(&song),
            None => err.into(),
        })?;

        tracing::debug!(item_id = %item.id, album_id = %album.id, song_id = %song.id, "tracklist item added");
        Ok(item)
    }

    pub async fn update_tracklist_item(
        &self,
        id: Uuid,
        changes: TracklistItemChanges,
    ) -> Result<tracklist_item::Model> {
        let current = self.tracklist_item(id).await?;

        let position = changes.position.unwrap_or(current.position);
        check_position("position", position)?;
        let album_id = match changes.album_id {
            Some(album_id) => self.album_ref(album_id).await?.id,
            None => current.album_id,
        };
        let song = self
            .song_ref(changes.song_id.unwrap_or(current.song_id))
            .await?;
        if self.pair_taken(album_id, song.id, Some(id)).await? {
            return Err(duplicate_item(&song));
        }

        let mut active: tracklist_item::ActiveModel = current.into();
        active.album_id = Set(album_id);
        active.song_id = Set(song.id);
        active.position = Set(position);
        active
            .update(self.db)
            .await
            .map_err(|err| match unique_violation(&err) {
                Some(_) => duplicate_item(&song),
                None => err.into(),
            })
    }

    pub async fn delete_tracklist_item(&self, id: Uuid) -> Result<()> {
        self.tracklist_item(id).await?;
        tracklist_item::Entity::delete_by_id(id).exec(self.db).await?;
        tracing::debug!(item_id = %id, "tracklist item deleted");
        Ok(())
    }
}
