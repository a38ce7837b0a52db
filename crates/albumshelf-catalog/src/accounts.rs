//! User accounts: registration, administrative creation, credential checks.

use albumshelf_db::entities::{user, user::UserRole};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{unique_violation, CatalogError, Result};
use crate::password::{hash_password, verify_password};
use crate::policy::Actor;
use crate::validation::required_text;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 64;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_EMAIL_LEN: usize = 255;

/// Self-service sign-up. Always produces an artist account.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub password_confirm: String,
}

/// Account created by an administrator, with an explicit role.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub role: UserRole,
}

/// Characters allowed in a username.
pub fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '+' | '-' | '_')
}

pub fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(CatalogError::validation(
            "username",
            format!("Username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters."),
        ));
    }
    if !username.chars().all(is_username_char) {
        return Err(CatalogError::validation(
            "username",
            "Username may only contain letters, numbers and . + - _ characters.",
        ));
    }
    Ok(username.to_string())
}

pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    let invalid = || CatalogError::validation("email", "Enter a valid email address.");

    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }
    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CatalogError::validation(
            "password",
            format!("This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."),
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(CatalogError::validation(
            "password",
            "This password is entirely numeric.",
        ));
    }
    Ok(())
}

/// The policy actor for a stored user. Inactive users become anonymous.
pub fn actor_for(user: &user::Model) -> Actor {
    Actor::from_user(user)
}

/// Account operations, borrowing the connection pool.
#[derive(Clone, Copy)]
pub struct Accounts<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> Accounts<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn register_artist(&self, registration: Registration) -> Result<user::Model> {
        if registration.password != registration.password_confirm {
            return Err(CatalogError::validation(
                "password_confirm",
                "The two password fields didn't match.",
            ));
        }
        self.create_account(NewAccount {
            username: registration.username,
            email: registration.email,
            display_name: registration.display_name,
            password: registration.password,
            role: UserRole::Artist,
        })
        .await
    }

    pub async fn create_account(&self, account: NewAccount) -> Result<user::Model> {
        let username = validate_username(&account.username)?;
        let email = validate_email(&account.email)?;
        let display_name = required_text("display_name", &account.display_name)?;
        validate_password(&account.password)?;

        if self.find_by_username(&username).await?.is_some() {
            return Err(CatalogError::conflict("user", "username", username));
        }

        let now = Utc::now().fixed_offset();
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.clone()),
            email: Set(email),
            password_hash: Set(hash_password(&account.password)?),
            display_name: Set(display_name),
            role: Set(account.role),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .map_err(|err| match unique_violation(&err) {
            Some(_) => CatalogError::conflict("user", "username", username.clone()),
            None => err.into(),
        })?;

        tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "account created");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<user::Model>> {
        Ok(user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db)
            .await?)
    }

    pub async fn user(&self, id: Uuid) -> Result<user::Model> {
        user::Entity::find_by_id(id)
            .one(self.db)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", id))
    }

    /// Check a username/password pair. Deactivated accounts are refused even
    /// with the right password.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<user::Model> {
        let user = self
            .find_by_username(username.trim())
            .await?
            .ok_or(CatalogError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            tracing::debug!(username = %user.username, "password mismatch");
            return Err(CatalogError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(CatalogError::PermissionDenied(
                "this account has been deactivated".to_string(),
            ));
        }
        Ok(user)
    }

    /// Clear the active flag. Accounts are never deleted.
    pub async fn deactivate(&self, username: &str) -> Result<user::Model> {
        let user = self
            .find_by_username(username)
            .await?
            .ok_or_else(|| CatalogError::not_found("user", username))?;

        let mut active: user::ActiveModel = user.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().fixed_offset());
        let user = active.update(self.db).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "account deactivated");
        Ok(user)
    }
}
