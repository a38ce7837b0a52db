use albumshelf_db::AppState;
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::api;
use crate::auth;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Allowed cross-origin callers. Empty means same-origin only.
    pub cors_origins: Vec<HeaderValue>,
    /// Per-IP rate limit on the public auth routes. Needs the connect info
    /// that `into_make_service_with_connect_info` provides.
    pub rate_limit: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            cors_origins: Vec::new(),
            rate_limit: true,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind = std::env::var("ALBUMSHELF_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid ALBUMSHELF_BIND: {e}"))?;

        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        Ok(Self {
            bind,
            cors_origins,
            rate_limit: true,
        })
    }
}

#[derive(Serialize)]
struct ApiStatus {
    status: &'static str,
    version: &'static str,
}

async fn healthz() -> Json<ApiStatus> {
    Json(ApiStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn cors_layer(origins: &[HeaderValue]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(tower_http::cors::Any)
        .expose_headers(tower_http::cors::Any);

    if origins.is_empty() {
        tracing::warn!("CORS_ORIGINS not set, cross-origin requests are refused");
        layer.allow_origin(AllowOrigin::list(Vec::<HeaderValue>::new()))
    } else {
        tracing::info!("CORS allowed origins: {:?}", origins);
        layer.allow_origin(origins.to_vec())
    }
}

fn auth_routes(state: &Arc<AppState>, config: &ServerConfig) -> Router<Arc<AppState>> {
    let mut public = Router::new()
        .route("/register", post(auth::routes::register))
        .route("/login", post(auth::routes::login))
        .route("/refresh", post(auth::routes::refresh));

    if config.rate_limit {
        // 10 requests burst, one token every 6 seconds per IP
        match GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .finish()
        {
            Some(conf) => public = public.layer(GovernorLayer::new(Arc::new(conf))),
            None => tracing::warn!("invalid rate limiter config, auth routes are unthrottled"),
        }
    }

    let protected = Router::new()
        .route("/me", get(auth::routes::me))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    public.merge(protected)
}

fn api_routes(state: &Arc<AppState>, config: &ServerConfig) -> Router<Arc<AppState>> {
    let catalog = Router::new()
        .route(
            "/albums/",
            get(api::albums::list_albums).post(api::albums::create_album),
        )
        .route(
            "/albums/{id}/",
            get(api::albums::get_album)
                .put(api::albums::replace_album)
                .patch(api::albums::patch_album)
                .delete(api::albums::delete_album),
        )
        .route("/albums/slug/{slug}/", get(api::albums::get_album_by_slug))
        .route(
            "/songs/",
            get(api::songs::list_songs).post(api::songs::create_song),
        )
        .route(
            "/songs/{id}/",
            get(api::songs::get_song)
                .put(api::songs::replace_song)
                .patch(api::songs::patch_song)
                .delete(api::songs::delete_song),
        )
        .route(
            "/tracklist/",
            get(api::tracklist::list_items).post(api::tracklist::create_item),
        )
        .route(
            "/tracklist/{id}/",
            get(api::tracklist::get_item)
                .put(api::tracklist::replace_item)
                .patch(api::tracklist::patch_item)
                .delete(api::tracklist::delete_item),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::attach_auth,
        ));

    Router::new()
        .nest("/auth", auth_routes(state, config))
        .merge(catalog)
}

fn ajax_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/song/create/", post(api::ajax::quick_create_song))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ))
}

/// The full HTTP application.
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_routes(&state, config))
        .nest("/ajax", ajax_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("referrer-policy"),
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .with_state(state)
}
