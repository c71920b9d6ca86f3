pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod repositories;
pub mod services;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::repositories::Repositories;
use crate::services::{
    admin::AdminService, auth::AuthService, booking::BookingService, notification::Notifier,
};

// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub cache: cache::CacheService,
    pub auth: AuthService,
    pub bookings: BookingService,
    pub admin: AdminService,
}

impl AppState {
    pub fn new(
        config: config::Config,
        repos: Repositories,
        cache: cache::CacheService,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Arc::new(Self {
            auth: AuthService::new(repos.users.clone(), &config),
            bookings: BookingService::new(repos.clone(), notifier),
            admin: AdminService::new(repos),
            cache,
            config,
        })
    }
}

pub fn init_tracing(app: &config::AppConfig) {
    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&app.rust_log));

    if app.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors_layer(app: &config::AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    if app.is_development() {
        return layer.allow_origin(AllowOrigin::mirror_request());
    }

    let origins: Vec<HeaderValue> = app
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// The full HTTP surface: `/health` plus every controller under `/api`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            user_id = tracing::field::Empty,
        )
    });

    Router::new()
        .route("/", get(|| async { "cinema booking API v1" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state.clone())
        .layer(cors_layer(&state.config.app))
        .layer(trace)
}
