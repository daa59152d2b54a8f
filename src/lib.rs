//! Stockbook API library
//!
//! Customers, materials, stock levels, priced usage records and orders over
//! a relational store, served as a JSON REST API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, Router};
use std::{path::Path, sync::Arc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};

use crate::{config::AppConfig, db::DbPool, services::stock::StockPolicy};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig) -> Self {
        let policy = StockPolicy {
            allow_negative: config.allow_negative_stock,
        };
        let services = handlers::AppServices::new(db.clone(), policy);
        Self {
            db,
            config,
            services,
        }
    }
}

/// All JSON endpoints, mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/customers", handlers::customers::customers_router())
        .nest("/materials", handlers::materials::materials_router())
        .nest("/stock", handlers::stock::stock_router())
        .nest("/usage", handlers::usage::usage_router())
        .nest("/orders", handlers::orders::orders_router())
        .merge(openapi::openapi_routes())
}

/// Builds the CORS layer. Explicit origins win over the permissive fallback.
pub fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            environment = %cfg.environment,
            "Using permissive CORS because no explicit origins are configured"
        );
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

/// Full application router: health, API, optional static site, and the
/// request-id, tracing, compression and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let static_dir = state.config.static_dir.clone();

    let mut app = Router::<AppState>::new()
        .merge(health::health_routes())
        .nest("/api", api_routes());

    let static_path = Path::new(&static_dir);
    if static_path.is_dir() {
        let index = static_path.join("index.html");
        app = app.fallback_service(ServeDir::new(static_path).fallback(ServeFile::new(index)));
    } else {
        ::tracing::debug!(static_dir = %static_dir, "Static directory missing, not serving files");
    }

    app.layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(environment: &str) -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            8080,
            environment.to_string(),
        )
    }

    #[test]
    fn state_carries_stock_policy_from_config() {
        let mut cfg = config("development");
        cfg.allow_negative_stock = false;
        let db = Arc::new(sea_orm::DatabaseConnection::Disconnected);
        let state = AppState::new(db, cfg);
        assert!(!state.services.stock.policy().allow_negative);
    }

    #[test]
    fn cors_layer_accepts_origin_lists() {
        let mut cfg = config("production");
        cfg.cors_allowed_origins = Some("https://a.example, ,https://b.example".to_string());
        let _ = cors_layer(&cfg);
    }
}
