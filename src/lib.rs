//! packtrack-api library
//!
//! Order placement/tracking backend for a packaging manufacturer plus an
//! embeddable polling order client (`client` module).
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod client;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod request_id;
pub mod services;

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub order_feed: events::OrderFeed,
    pub services: handlers::AppServices,
}

/// The HTTP surface, relative to the configured base path.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Auth
        .route("/login", post(handlers::auth::login))
        .route("/production-login", post(handlers::auth::production_login))
        // Stacks
        .route(
            "/stacks",
            post(handlers::stacks::create_stack).get(handlers::stacks::list_stacks),
        )
        .route(
            "/stacks/:id",
            put(handlers::stacks::update_stack).delete(handlers::stacks::delete_stack),
        )
        // Orders
        .route("/place-order", post(handlers::orders::place_order))
        .route("/orders", get(handlers::orders::list_orders))
        .route(
            "/orders/:id",
            patch(handlers::orders::update_order_status).delete(handlers::orders::delete_order),
        )
        .route(
            "/orders/:id/products/:product_id",
            put(handlers::orders::update_line_item),
        )
        .route("/orders/:id/complete", post(handlers::orders::complete_order))
        // Liveness
        .route("/health", get(health_check))
}

/// Builds the complete application router: routes nested under the
/// configured base path, plus the fallback for unknown endpoints.
pub fn app(state: AppState) -> Router {
    let api = routes();
    let router = match state.config.api_base() {
        Some(base) => Router::new().nest(&base, api),
        None => api,
    };

    router.fallback(not_found).with_state(state)
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<Value>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Ok(Json(json!({
        "status": db_status,
        "checks": { "database": db_status },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn not_found(method: Method, uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Endpoint not found",
            "message": format!("Route {} {} does not exist", method, uri.path()),
        })),
    )
}
