//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store and engine wiring
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use restock_infra::RestockConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Uploaded sales files can be larger than axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Build the HTTP router around already-wired services.
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(Extension(services))
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

/// Wire services from configuration and build the router (used by `main.rs`).
pub async fn build_app_from_config(config: &RestockConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config).await?;
    Ok(build_app(Arc::new(services)))
}
