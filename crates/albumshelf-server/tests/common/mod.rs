// Shared test utilities for HTTP integration tests
#![allow(dead_code)]

use albumshelf_catalog::{Accounts, NewAccount};
use albumshelf_db::entities::{user, user::UserRole};
use albumshelf_db::{connect, AppState, DatabaseConfig};
use albumshelf_migration::{Migrator, MigratorTrait};
use albumshelf_server::auth::jwt::generate_token_pair;
use albumshelf_server::{router, ServerConfig};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-for-testing-only";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

/// App backed by a fresh in-memory SQLite database. Rate limiting is off
/// because oneshot requests carry no peer address.
pub async fn test_app() -> TestApp {
    let db = connect(&DatabaseConfig::single("sqlite::memory:"))
        .await
        .expect("connect to in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");

    let state = Arc::new(AppState {
        db,
        jwt_secret: TEST_JWT_SECRET.to_string(),
    });
    let config = ServerConfig {
        rate_limit: false,
        ..ServerConfig::default()
    };
    TestApp {
        router: router(state.clone(), &config),
        state,
    }
}

impl TestApp {
    pub async fn user(&self, username: &str, display_name: &str, role: UserRole) -> user::Model {
        Accounts::new(&self.state.db)
            .create_account(NewAccount {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                display_name: display_name.to_string(),
                password: "correct-horse".to_string(),
                role,
            })
            .await
            .expect("create test user")
    }

    /// Create a user and return a bearer access token for it.
    pub async fn token(&self, username: &str, display_name: &str, role: UserRole) -> String {
        let user = self.user(username, display_name, role).await;
        token_for(&user)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        send(self.router.clone(), builder.body(body).unwrap()).await
    }

    pub async fn form(&self, uri: &str, token: Option<&str>, form: &str) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        send(
            self.router.clone(),
            builder.body(Body::from(form.to_string())).unwrap(),
        )
        .await
    }
}

pub fn token_for(user: &user::Model) -> String {
    generate_token_pair(user.id, &user.username, user.role, TEST_JWT_SECRET)
        .unwrap()
        .access_token
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn abbey_road() -> Value {
    serde_json::json!({
        "title": "Abbey Road",
        "artist": "The Beatles",
        "description": "The eleventh studio album by the English rock band the Beatles.",
        "price": "25.99",
        "format": "vinyl",
        "release_date": "1969-09-26",
        "tracklist": [
            { "song": { "title": "Come Together", "running_time": 259 }, "position": 1 },
            { "song": { "title": "Something", "running_time": 183 }, "position": 2 }
        ]
    })
}
