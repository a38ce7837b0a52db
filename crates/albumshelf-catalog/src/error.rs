//! Catalog error types.

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// A field failed a constraint. `field` names the offending input,
    /// e.g. `price` or `tracklist[2].song_id`.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// A uniqueness constraint would be violated.
    #[error("{resource} with {fields} '{value}' already exists")]
    Conflict {
        resource: &'static str,
        fields: &'static str,
        value: String,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password hashing error: {0}")]
    PasswordHash(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl CatalogError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    pub fn conflict(resource: &'static str, fields: &'static str, value: impl Into<String>) -> Self {
        Self::Conflict {
            resource,
            fields,
            value: value.into(),
        }
    }

    /// Field name for validation errors, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<argon2::password_hash::Error> for CatalogError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err.to_string())
    }
}

/// Message of a unique-constraint violation, if that is what `err` is.
pub(crate) fn unique_violation(err: &DbErr) -> Option<String> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => Some(msg),
        _ => None,
    }
}
