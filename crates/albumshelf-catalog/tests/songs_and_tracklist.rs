mod common;

use albumshelf_catalog::validation::parse_running_time;
use albumshelf_catalog::{
    Catalog, CatalogError, NewSong, NewTracklistItem, Page, SongChanges, TracklistEntry,
    TracklistItemChanges,
};
use albumshelf_db::entities::{album::AlbumFormat, tracklist_item};
use common::{abbey_road, album_input, editor, test_db};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

#[tokio::test]
async fn test_running_time_floor() {
    let db = test_db().await;
    let catalog = Catalog::new(&db);

    let err = catalog
        .create_song(NewSong::new("Too Short", 9))
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("running_time"));

    let song = catalog
        .create_song(NewSong::new("Just Long Enough", 10))
        .await
        .unwrap();
    assert_eq!(song.running_time, 10);
    assert_eq!(song.formatted_time(), "0:10");
}

#[tokio::test]
async fn test_song_titles_unique_ignoring_case() {
    let db = test_db().await;
    let catalog = Catalog::new(&db);

    catalog.create_song(NewSong::new("Something", 183)).await.unwrap();
    let err = catalog
        .create_song(NewSong::new("SOMETHING", 200))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { resource: "song", .. }));
}

#[test]
fn test_non_numeric_running_time_rejected() {
    let err = parse_running_time("four minutes").unwrap_err();
    assert!(matches!(err, CatalogError::Validation { .. }));
}

#[tokio::test]
async fn test_song_listing_and_update() {
    let db = test_db().await;
    let catalog = Catalog::new(&db);
    let time = catalog.create_song(NewSong::new("Time", 413)).await.unwrap();
    catalog.create_song(NewSong::new("Money", 382)).await.unwrap();

    let page = catalog.list_songs(Page::default()).await.unwrap();
    let titles: Vec<_> = page.data.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Money", "Time"]);

    let updated = catalog
        .update_song(
            time.id,
            SongChanges {
                running_time: Some(421),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Time");
    assert_eq!(updated.running_time, 421);

    // Case-only rename of itself is allowed; taking another title is not.
    assert!(catalog
        .update_song(
            time.id,
            SongChanges {
                title: Some("TIME".into()),
                ..Default::default()
            },
        )
        .await
        .is_ok());
    let err = catalog
        .update_song(
            time.id,
            SongChanges {
                title: Some("money".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { .. }));
}

#[tokio::test]
async fn test_deleting_song_removes_its_tracklist_rows() {
    let db = test_db().await;
    let catalog = Catalog::new(&db);
    let song = catalog.create_song(NewSong::new("Something", 183)).await.unwrap();
    let album = catalog
        .create_album(&editor(), abbey_road(), vec![TracklistEntry::existing(song.id, Some(1))])
        .await
        .unwrap();

    catalog.delete_song(song.id).await.unwrap();
    assert_eq!(tracklist_item::Entity::find().count(&db).await.unwrap(), 0);
    let detail = catalog.album_detail(album.album.id).await.unwrap();
    assert!(detail.tracklist.is_empty());

    assert!(matches!(
        catalog.delete_song(song.id).await,
        Err(CatalogError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_tracklist_item_crud() {
    let db = test_db().await;
    let catalog = Catalog::new(&db);
    let album = catalog.create_album(&editor(), abbey_road(), vec![]).await.unwrap();
    let a = catalog.create_song(NewSong::new("Come Together", 259)).await.unwrap();
    let b = catalog.create_song(NewSong::new("Something", 183)).await.unwrap();

    let first = catalog
        .add_tracklist_item(NewTracklistItem {
            album_id: album.album.id,
            song_id: b.id,
            position: None,
        })
        .await
        .unwrap();
    catalog
        .add_tracklist_item(NewTracklistItem {
            album_id: album.album.id,
            song_id: a.id,
            position: Some(1),
        })
        .await
        .unwrap();

    let items = catalog
        .list_tracklist_items(Some(album.album.id))
        .await
        .unwrap();
    let songs: Vec<_> = items.iter().map(|i| i.song_id).collect();
    assert_eq!(songs, [a.id, b.id], "unpositioned rows sort last");

    let moved = catalog
        .update_tracklist_item(
            first.id,
            TracklistItemChanges {
                position: Some(Some(2)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.position, Some(2));

    let cleared = catalog
        .update_tracklist_item(
            first.id,
            TracklistItemChanges {
                position: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.position, None);

    catalog.delete_tracklist_item(first.id).await.unwrap();
    assert!(matches!(
        catalog.tracklist_item(first.id).await,
        Err(CatalogError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_tracklist_item_pair_unique() {
    let db = test_db().await;
    let catalog = Catalog::new(&db);
    let album = catalog.create_album(&editor(), abbey_road(), vec![]).await.unwrap();
    let song = catalog.create_song(NewSong::new("Something", 183)).await.unwrap();
    let other = catalog.create_song(NewSong::new("Because", 165)).await.unwrap();

    let new = || NewTracklistItem {
        album_id: album.album.id,
        song_id: song.id,
        position: Some(1),
    };
    catalog.add_tracklist_item(new()).await.unwrap();
    let err = catalog.add_tracklist_item(new()).await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { .. }));

    let second = catalog
        .add_tracklist_item(NewTracklistItem {
            album_id: album.album.id,
            song_id: other.id,
            position: Some(2),
        })
        .await
        .unwrap();
    let err = catalog
        .update_tracklist_item(
            second.id,
            TracklistItemChanges {
                song_id: Some(song.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Conflict { .. }));
}

#[tokio::test]
async fn test_tracklist_item_reference_checks() {
    let db = test_db().await;
    let catalog = Catalog::new(&db);
    let album = catalog
        .create_album(&editor(), album_input("Animals", "Pink Floyd", AlbumFormat::Vinyl), vec![])
        .await
        .unwrap();
    let song = catalog.create_song(NewSong::new("Dogs", 1024)).await.unwrap();

    let err = catalog
        .add_tracklist_item(NewTracklistItem {
            album_id: Uuid::new_v4(),
            song_id: song.id,
            position: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("album_id"));

    let err = catalog
        .add_tracklist_item(NewTracklistItem {
            album_id: album.album.id,
            song_id: Uuid::new_v4(),
            position: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("song_id"));

    let err = catalog
        .add_tracklist_item(NewTracklistItem {
            album_id: album.album.id,
            song_id: song.id,
            position: Some(-1),
        })
        .await
        .unwrap_err();
    assert_eq!(err.field(), Some("position"));
}
