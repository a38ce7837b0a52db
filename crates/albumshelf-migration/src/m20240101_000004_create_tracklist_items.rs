use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_albums::Albums;
use super::m20240101_000003_create_songs::Songs;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TracklistItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TracklistItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TracklistItems::AlbumId).uuid().not_null())
                    .col(ColumnDef::new(TracklistItems::SongId).uuid().not_null())
                    .col(ColumnDef::new(TracklistItems::Position).integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracklist_items_album_id")
                            .from(TracklistItems::Table, TracklistItems::AlbumId)
                            .to(Albums::Table, Albums::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracklist_items_song_id")
                            .from(TracklistItems::Table, TracklistItems::SongId)
                            .to(Songs::Table, Songs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_tracklist_items_album_song")
                    .table(TracklistItems::Table)
                    .col(TracklistItems::AlbumId)
                    .col(TracklistItems::SongId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TracklistItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TracklistItems {
    Table,
    Id,
    AlbumId,
    SongId,
    Position,
}
