use albumshelf_catalog::CatalogError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{0}")]
    Unauthorized(String),
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Catalog(err) => match err {
                CatalogError::Validation { .. } => StatusCode::BAD_REQUEST,
                CatalogError::Conflict { .. } => StatusCode::CONFLICT,
                CatalogError::PermissionDenied(_) => StatusCode::FORBIDDEN,
                CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
                CatalogError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                CatalogError::PasswordHash(_) | CatalogError::Database(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body sent to the client. Internal failures are logged and masked.
    pub fn body(&self) -> ErrorResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
            return ErrorResponse {
                error: "Internal server error".to_string(),
                field: None,
            };
        }

        match self {
            Self::Catalog(CatalogError::Validation { field, message }) => ErrorResponse {
                error: message.clone(),
                field: Some(field.clone()),
            },
            other => ErrorResponse {
                error: other.to_string(),
                field: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (CatalogError::validation("price", "bad"), StatusCode::BAD_REQUEST),
            (CatalogError::conflict("album", "slug", "x"), StatusCode::CONFLICT),
            (
                CatalogError::PermissionDenied("no".into()),
                StatusCode::FORBIDDEN,
            ),
            (CatalogError::not_found("album", "1"), StatusCode::NOT_FOUND),
            (CatalogError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (
                CatalogError::Database(DbErr::Custom("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
        assert_eq!(
            ApiError::unauthorized("missing token").status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_validation_body_names_field() {
        let body = ApiError::from(CatalogError::validation("price", "Too much.")).body();
        assert_eq!(body.error, "Too much.");
        assert_eq!(body.field.as_deref(), Some("price"));
    }

    #[test]
    fn test_database_error_is_masked() {
        let body = ApiError::from(CatalogError::Database(DbErr::Custom(
            "connection refused at 10.0.0.5".into(),
        )))
        .body();
        assert_eq!(body.error, "Internal server error");
        assert!(body.field.is_none());
    }

    #[test]
    fn test_body_serialization_omits_missing_field() {
        let body = ApiError::from(CatalogError::not_found("album", "42")).body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "error": "album 42 not found" }));
    }
}
