use albumshelf_catalog::{accounts::actor_for, Accounts, Actor, CatalogError};
use albumshelf_db::AppState;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use std::sync::Arc;

use super::jwt::{validate_token, TokenType};
use crate::error::{ApiError, ApiResult};

/// The caller of the current request, anonymous unless a valid access token
/// was presented.
#[derive(Clone, Debug)]
pub struct CurrentActor(pub Actor);

/// Like [`CurrentActor`], but rejects anonymous callers with 401.
#[derive(Clone, Debug)]
pub struct AuthenticatedActor(pub Actor);

/// `Ok(None)` when no Authorization header is present.
fn bearer_token(headers: &HeaderMap) -> ApiResult<Option<&str>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| Some(token.trim()))
        .ok_or_else(|| ApiError::unauthorized("Missing or invalid Authorization header"))
}

/// Resolve an access token to the actor it belongs to. The user is reloaded
/// so deactivation takes effect before the token expires.
async fn actor_from_token(state: &AppState, token: &str) -> ApiResult<Actor> {
    let claims = validate_token(token, &state.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;
    if claims.token_type != TokenType::Access {
        return Err(ApiError::unauthorized(
            "Invalid token type, access token required",
        ));
    }

    match Accounts::new(&state.db).user(claims.sub).await {
        Ok(user) => Ok(actor_for(&user)),
        Err(CatalogError::NotFound { .. }) => {
            Err(ApiError::unauthorized("User no longer exists"))
        }
        Err(err) => Err(err.into()),
    }
}

/// Attach the caller's actor when a token is present; anonymous otherwise.
/// A malformed or expired token is rejected rather than downgraded.
pub async fn attach_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let actor = match bearer_token(request.headers()) {
        Ok(Some(token)) => match actor_from_token(&state, token).await {
            Ok(actor) => actor,
            Err(err) => return err.into_response(),
        },
        Ok(None) => Actor::anonymous(),
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(CurrentActor(actor));
    next.run(request).await
}

/// Require a valid access token belonging to an active user.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(Some(token)) => token,
        Ok(None) => {
            return ApiError::unauthorized("Missing or invalid Authorization header")
                .into_response()
        }
        Err(err) => return err.into_response(),
    };

    let actor = match actor_from_token(&state, token).await {
        Ok(actor) if actor.is_authenticated() => actor,
        Ok(_) => return ApiError::unauthorized("This account has been deactivated").into_response(),
        Err(err) => return err.into_response(),
    };

    request.extensions_mut().insert(CurrentActor(actor));
    next.run(request).await
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentActor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentActor>()
            .cloned()
            .unwrap_or_else(|| CurrentActor(Actor::anonymous())))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentActor(actor) = CurrentActor::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});
        if !actor.is_authenticated() {
            return Err(ApiError::unauthorized(
                "Authentication credentials were not provided",
            ));
        }
        Ok(AuthenticatedActor(actor))
    }
}
