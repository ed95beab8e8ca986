//! HTTP Routes
//!
//! - `/` - Question form (single page)
//! - `/api/ask` - Upload a document and stream the answer
//! - `/api/health` - Health check

pub mod ask;
pub mod health;
pub mod ui;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(ui::router())
        .merge(ask::router(state.clone()))
        .merge(health::router(state))
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}
