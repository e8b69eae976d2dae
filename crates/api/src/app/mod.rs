//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: operations over the record repository
//! - `routes/`: HTTP routes + handlers (one file per record type)
//! - `dto.rs`: request DTOs, pagination and response envelopes
//! - `errors.rs`: consistent error responses
//! - `extract.rs`: body/query extractors that reject with the error envelope

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Base path of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// Build the full HTTP router with fresh in-memory storage.
pub fn build_app(config: &ApiConfig) -> Router {
    build_app_with(services::AppServices::in_memory(config.max_page_size))
}

/// Build the router around existing services.
pub fn build_app_with(services: services::AppServices) -> Router {
    let services = Arc::new(services);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest(API_PREFIX, routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::trace_requests))
                .layer(Extension(services)),
        )
}
