use albumshelf_catalog::{validation::parse_running_time, Catalog, CatalogError, NewSong};
use albumshelf_db::AppState;
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::songs::SongResponse;
use crate::error::ApiError;

/// Form body posted by the inline "new song" widget on the album form.
#[derive(Debug, Default, Deserialize)]
pub struct QuickSongForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub running_time: String,
}

#[derive(Debug, Serialize)]
struct QuickSongReply {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    song: Option<SongResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn rejected(message: impl Into<String>) -> Response {
    let reply = QuickSongReply {
        success: false,
        song: None,
        error: Some(message.into()),
    };
    (StatusCode::BAD_REQUEST, Json(reply)).into_response()
}

/// POST /ajax/song/create/ (requires auth)
///
/// Validation and duplicate titles are reported as 400 with a message the
/// widget shows verbatim.
pub async fn quick_create_song(
    State(state): State<Arc<AppState>>,
    form: Result<Form<QuickSongForm>, FormRejection>,
) -> Response {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return rejected(rejection.body_text()),
    };
    let title = form.title.trim();
    let raw_time = form.running_time.trim();
    if title.is_empty() || raw_time.is_empty() {
        return rejected("Both title and running time are required.");
    }

    let running_time = match parse_running_time(raw_time) {
        Ok(seconds) => seconds,
        Err(err) => return rejected(message_of(err)),
    };

    let new = NewSong::new(title, i64::from(running_time));
    match Catalog::new(&state.db).create_song(new).await {
        Ok(song) => {
            let reply = QuickSongReply {
                success: true,
                song: Some(song.into()),
                error: None,
            };
            (StatusCode::OK, Json(reply)).into_response()
        }
        Err(CatalogError::Conflict { value, .. }) => {
            rejected(format!("A song with the title \"{value}\" already exists."))
        }
        Err(err @ CatalogError::Validation { .. }) => rejected(message_of(err)),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn message_of(err: CatalogError) -> String {
    match err {
        CatalogError::Validation { message, .. } => message,
        other => other.to_string(),
    }
}
