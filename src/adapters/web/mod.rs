//! Web server adapter.
//!
//! Axum JSON API exposing the analysis to browser frontends. CORS is
//! wide open; the API is read-only and unauthenticated.

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::ports::data_port::DataPort;

pub struct AppState {
    pub data_port: Arc<dyn DataPort + Send + Sync>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/analyze", get(handlers::analyze))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
