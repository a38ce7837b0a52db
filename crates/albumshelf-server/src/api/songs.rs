use albumshelf_catalog::{Catalog, NewSong, Paginated, SongChanges};
use albumshelf_db::entities::song;
use albumshelf_db::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::PaginationParams;
use crate::error::ApiResult;
use crate::extract::Json;

#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub id: Uuid,
    pub title: String,
    pub running_time: i32,
    pub formatted_time: String,
}

impl From<song::Model> for SongResponse {
    fn from(s: song::Model) -> Self {
        Self {
            formatted_time: s.formatted_time(),
            id: s.id,
            title: s.title,
            running_time: s.running_time,
        }
    }
}

/// GET /api/songs/
pub async fn list_songs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<Paginated<SongResponse>>> {
    let page = Catalog::new(&state.db).list_songs(params.page()).await?;
    Ok(Json(Paginated {
        data: page.data.into_iter().map(SongResponse::from).collect(),
        total: page.total,
        page: page.page,
        per_page: page.per_page,
        total_pages: page.total_pages,
    }))
}

/// POST /api/songs/
pub async fn create_song(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewSong>,
) -> ApiResult<(StatusCode, Json<SongResponse>)> {
    let song = Catalog::new(&state.db).create_song(body).await?;
    Ok((StatusCode::CREATED, Json(song.into())))
}

/// GET /api/songs/{id}/
pub async fn get_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SongResponse>> {
    let song = Catalog::new(&state.db).song(id).await?;
    Ok(Json(song.into()))
}

/// PUT /api/songs/{id}/
pub async fn replace_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<NewSong>,
) -> ApiResult<Json<SongResponse>> {
    let changes = SongChanges {
        title: Some(body.title),
        running_time: Some(body.running_time),
    };
    let song = Catalog::new(&state.db).update_song(id, changes).await?;
    Ok(Json(song.into()))
}

/// PATCH /api/songs/{id}/
pub async fn patch_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<SongChanges>,
) -> ApiResult<Json<SongResponse>> {
    let song = Catalog::new(&state.db).update_song(id, body).await?;
    Ok(Json(song.into()))
}

/// DELETE /api/songs/{id}/
pub async fn delete_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Catalog::new(&state.db).delete_song(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
