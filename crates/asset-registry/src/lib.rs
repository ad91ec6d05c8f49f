//! Asset Registry Service
//!
//! HTTP service for creating, reading, updating, deleting and searching IT
//! asset records kept in a document store.
//!
//! ## Endpoints
//!
//! - `POST /assets/` - Create an asset
//! - `GET /assets/` - List assets (`q`, `skip`, `limit`)
//! - `GET /assets/{id}` - Get an asset
//! - `PUT /assets/{id}` - Replace an asset
//! - `DELETE /assets/{id}` - Delete an asset
//! - `GET /health` - Health check

pub mod config;
pub mod handlers;
pub mod models;
pub mod service;
pub mod storage;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use handlers::AppState;
pub use models::{Asset, AssetFields, ListParams};
pub use service::AssetService;
pub use storage::{AssetFilter, MemoryStore, RecordStore, RedisStore};

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/assets/",
            get(handlers::list_assets_handler).post(handlers::create_asset_handler),
        )
        .route(
            "/assets",
            get(handlers::list_assets_handler).post(handlers::create_asset_handler),
        )
        .route(
            "/assets/{asset_id}",
            get(handlers::get_asset_handler)
                .put(handlers::update_asset_handler)
                .delete(handlers::delete_asset_handler),
        )
        .with_state(shared_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
