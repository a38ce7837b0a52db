use albumshelf_catalog::{Catalog, NewTracklistItem, TracklistItemChanges};
use albumshelf_db::entities::tracklist_item;
use albumshelf_db::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::Json;

#[derive(Debug, Default, Deserialize)]
pub struct TracklistQuery {
    pub album_id: Option<Uuid>,
}

/// GET /api/tracklist/
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TracklistQuery>,
) -> ApiResult<Json<Vec<tracklist_item::Model>>> {
    let items = Catalog::new(&state.db)
        .list_tracklist_items(query.album_id)
        .await?;
    Ok(Json(items))
}

/// POST /api/tracklist/
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTracklistItem>,
) -> ApiResult<(StatusCode, Json<tracklist_item::Model>)> {
    let item = Catalog::new(&state.db).add_tracklist_item(body).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/tracklist/{id}/
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<tracklist_item::Model>> {
    Ok(Json(Catalog::new(&state.db).tracklist_item(id).await?))
}

/// PUT /api/tracklist/{id}/
pub async fn replace_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<NewTracklistItem>,
) -> ApiResult<Json<tracklist_item::Model>> {
    let changes = TracklistItemChanges {
        album_id: Some(body.album_id),
        song_id: Some(body.song_id),
        position: Some(body.position),
    };
    let item = Catalog::new(&state.db)
        .update_tracklist_item(id, changes)
        .await?;
    Ok(Json(item))
}

/// PATCH /api/tracklist/{id}/
pub async fn patch_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<TracklistItemChanges>,
) -> ApiResult<Json<tracklist_item::Model>> {
    let item = Catalog::new(&state.db).update_tracklist_item(id, body).await?;
    Ok(Json(item))
}

/// DELETE /api/tracklist/{id}/
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Catalog::new(&state.db).delete_tracklist_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
