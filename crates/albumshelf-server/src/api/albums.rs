use albumshelf_catalog::{
    permits, Actor, AlbumAction, AlbumChanges, AlbumDetail, AlbumInput, AlbumSummary, Catalog,
    Paginated, TracklistEntry,
};
use albumshelf_db::entities::album::AlbumFormat;
use albumshelf_db::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::PaginationParams;
use crate::auth::middleware::{AuthenticatedActor, CurrentActor};
use crate::error::ApiResult;
use crate::extract::Json;

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    /// Tracklist item id
    pub id: Uuid,
    pub song_id: Uuid,
    pub title: String,
    pub running_time: i32,
    pub formatted_time: String,
    pub position: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AlbumDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub slug: String,
    pub description: String,
    pub short_description: String,
    pub price: String,
    pub format: AlbumFormat,
    pub format_label: &'static str,
    pub release_date: chrono::NaiveDate,
    pub release_year: i32,
    pub cover_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub display: String,
    pub tracklist: Vec<TrackResponse>,
    pub total_playtime: i64,
    pub formatted_playtime: String,
    pub can_edit: bool,
    pub can_delete: bool,
}

impl AlbumDetailResponse {
    pub fn new(detail: AlbumDetail, actor: &Actor) -> Self {
        let total_playtime = detail.total_playtime();
        let formatted_playtime = detail.formatted_playtime();
        let AlbumDetail { album, tracklist } = detail;

        Self {
            can_edit: permits(actor, AlbumAction::Edit, Some(album.artist.as_str())),
            can_delete: permits(actor, AlbumAction::Delete, Some(album.artist.as_str())),
            display: album.to_string(),
            short_description: album.short_description(),
            price: album.price_display(),
            release_year: album.release_year(),
            format_label: album.format.label(),
            tracklist: tracklist
                .into_iter()
                .map(|t| TrackResponse {
                    id: t.item.id,
                    song_id: t.song.id,
                    formatted_time: t.song.formatted_time(),
                    title: t.song.title,
                    running_time: t.song.running_time,
                    position: t.item.position,
                })
                .collect(),
            total_playtime,
            formatted_playtime,
            id: album.id,
            title: album.title,
            artist: album.artist,
            slug: album.slug,
            description: album.description,
            format: album.format,
            release_date: album.release_date,
            cover_url: album.cover_url,
            created_at: album.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumRequest {
    #[serde(flatten)]
    pub album: AlbumInput,
    #[serde(default)]
    pub tracklist: Vec<TracklistEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceAlbumRequest {
    #[serde(flatten)]
    pub album: AlbumInput,
    pub tracklist: Option<Vec<TracklistEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct PatchAlbumRequest {
    #[serde(flatten)]
    pub changes: AlbumChanges,
    pub tracklist: Option<Vec<TracklistEntry>>,
}

/// GET /api/albums/
pub async fn list_albums(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<Paginated<AlbumSummary>>> {
    let page = Catalog::new(&state.db)
        .list_albums(&actor, params.page())
        .await?;
    Ok(Json(page))
}

/// GET /api/albums/{id}/
pub async fn get_album(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AlbumDetailResponse>> {
    let detail = Catalog::new(&state.db).album_detail(id).await?;
    Ok(Json(AlbumDetailResponse::new(detail, &actor)))
}

/// GET /api/albums/slug/{slug}/
pub async fn get_album_by_slug(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(slug): Path<String>,
) -> ApiResult<Json<AlbumDetailResponse>> {
    let detail = Catalog::new(&state.db).album_detail_by_slug(&slug).await?;
    Ok(Json(AlbumDetailResponse::new(detail, &actor)))
}

/// POST /api/albums/
pub async fn create_album(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Json(body): Json<CreateAlbumRequest>,
) -> ApiResult<(StatusCode, Json<AlbumDetailResponse>)> {
    let detail = Catalog::new(&state.db)
        .create_album(&actor, body.album, body.tracklist)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(AlbumDetailResponse::new(detail, &actor)),
    ))
}

/// PUT /api/albums/{id}/
pub async fn replace_album(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
    Json(body): Json<ReplaceAlbumRequest>,
) -> ApiResult<Json<AlbumDetailResponse>> {
    let detail = Catalog::new(&state.db)
        .update_album(&actor, id, body.album.into(), body.tracklist)
        .await?;
    Ok(Json(AlbumDetailResponse::new(detail, &actor)))
}

/// PATCH /api/albums/{id}/
pub async fn patch_album(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
    Json(body): Json<PatchAlbumRequest>,
) -> ApiResult<Json<AlbumDetailResponse>> {
    let detail = Catalog::new(&state.db)
        .update_album(&actor, id, body.changes, body.tracklist)
        .await?;
    Ok(Json(AlbumDetailResponse::new(detail, &actor)))
}

/// DELETE /api/albums/{id}/
pub async fn delete_album(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    Catalog::new(&state.db).delete_album(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
