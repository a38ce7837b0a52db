//! Request body extraction reporting malformed input as validation errors.

use albumshelf_catalog::CatalogError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::ApiError;

/// Field reported when the failure cannot be tied to a single field.
pub const BODY_FIELD: &str = "body";

/// JSON body or response. Unlike `axum::Json`, a body that does not fit the
/// target type is rejected with a 400 naming the offending field.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<serde_json::Value>::from_request(req, state).await?;
        serde_path_to_error::deserialize(value)
            .map(Json)
            .map_err(|err| ApiError::from(data_error(&err)))
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        CatalogError::validation(BODY_FIELD, rejection.body_text()).into()
    }
}

fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.split('`').next()
}

/// Map a typed deserialization failure onto the field it concerns.
fn data_error(err: &serde_path_to_error::Error<serde_json::Error>) -> CatalogError {
    let path = err.path().to_string();
    let parent = (path != ".").then_some(path);
    let message = err.inner().to_string();

    if let Some(name) = missing_field(&message) {
        let field = match parent {
            Some(parent) => format!("{parent}.{name}"),
            None => name.to_string(),
        };
        return CatalogError::validation(field, "This field is required.");
    }

    CatalogError::validation(
        parent.unwrap_or_else(|| BODY_FIELD.to_string()),
        format!("Invalid value: {message}."),
    )
}
