//! HTTP surface: the query page, its form submission and a small JSON API.

pub mod api;
pub mod page;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::service::GeoMeshService;

/// Shared handler state. Built once in `main`, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GeoMeshService>,
}

impl AppState {
    pub fn new(service: GeoMeshService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/query", post(page::submit_query))
        .route("/api/query", post(api::query))
        .route("/api/facilities", get(api::facilities))
        .route("/api/map", get(api::map))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}
