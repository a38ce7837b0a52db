use albumshelf_db::entities::user::UserRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ACCESS_TOKEN_MINUTES: i64 = 15;
pub const REFRESH_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    /// Role at issue time. Authorization reloads the user, so this is
    /// informational for clients.
    pub role: UserRole,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn sign(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Issue an access + refresh token pair for a user.
pub fn generate_token_pair(
    user_id: Uuid,
    username: &str,
    role: UserRole,
    secret: &str,
) -> Result<TokenPair, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = |token_type, exp: chrono::DateTime<Utc>| Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        token_type,
        iat: now.timestamp(),
        exp: exp.timestamp(),
    };

    let access = claims(TokenType::Access, now + Duration::minutes(ACCESS_TOKEN_MINUTES));
    let refresh = claims(TokenType::Refresh, now + Duration::days(REFRESH_TOKEN_DAYS));

    Ok(TokenPair {
        access_token: sign(&access, secret)?,
        refresh_token: sign(&refresh, secret)?,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_MINUTES * 60,
    })
}

/// Validate signature and expiry, returning the claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
