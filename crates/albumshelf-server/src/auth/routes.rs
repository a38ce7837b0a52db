use albumshelf_catalog::{Accounts, CatalogError, Registration};
use albumshelf_db::entities::{user, user::UserRole};
use albumshelf_db::AppState;
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::jwt::{generate_token_pair, validate_token, TokenPair, TokenType};
use super::middleware::AuthenticatedActor;
use crate::error::{ApiError, ApiResult};
use crate::extract::Json;

// ─── Request/Response DTOs ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            display_name: u.display_name,
            role: u.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub role: UserRole,
    pub tokens: TokenPair,
}

fn auth_response(user: user::Model, secret: &str) -> ApiResult<AuthResponse> {
    let tokens = generate_token_pair(user.id, &user.username, user.role, secret)?;
    Ok(AuthResponse {
        role: user.role,
        user: user.into(),
        tokens,
    })
}

// ─── Handlers ──────────────────────────────────────────────────────

/// POST /api/auth/register
///
/// Self-registration always creates an artist.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Registration>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let created = Accounts::new(&state.db).register_artist(body).await?;
    Ok((
        StatusCode::CREATED,
        Json(auth_response(created, &state.jwt_secret)?),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let user = Accounts::new(&state.db)
        .authenticate(&body.username, &body.password)
        .await?;
    tracing::info!(user_id = %user.id, "login");
    Ok(Json(auth_response(user, &state.jwt_secret)?))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let claims = validate_token(&body.refresh_token, &state.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired refresh token"))?;
    if claims.token_type != TokenType::Refresh {
        return Err(ApiError::unauthorized("Invalid token type"));
    }

    let user = match Accounts::new(&state.db).user(claims.sub).await {
        Ok(user) => user,
        Err(CatalogError::NotFound { .. }) => {
            return Err(ApiError::unauthorized("User no longer exists"))
        }
        Err(err) => return Err(err.into()),
    };
    if !user.is_active {
        return Err(CatalogError::PermissionDenied(
            "this account has been deactivated".to_string(),
        )
        .into());
    }

    let tokens = generate_token_pair(user.id, &user.username, user.role, &state.jwt_secret)?;
    Ok(Json(tokens))
}

/// GET /api/auth/me (requires auth)
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthenticatedActor(actor): AuthenticatedActor,
) -> ApiResult<Json<UserResponse>> {
    let id = actor
        .user_id
        .ok_or_else(|| ApiError::unauthorized("Authentication credentials were not provided"))?;
    let user = Accounts::new(&state.db).user(id).await?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_user_response_hides_password_hash() {
        let now = Utc::now().fixed_offset();
        let user = user::Model {
            id: Uuid::new_v4(),
            username: "beatles".into(),
            email: "beatles@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            display_name: "The Beatles".into(),
            role: UserRole::Artist,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json["role"], "artist");
        assert_eq!(json["display_name"], "The Beatles");
        assert!(json.get("password_hash").is_none());
    }
}
