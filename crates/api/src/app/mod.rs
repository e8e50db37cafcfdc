//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, chat and preference wiring
//! - `routes/`: HTTP routes + handlers (one file per endpoint family)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use finanzas_store::StoreError;

use crate::config::AppConfig;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from configuration (used by `main.rs`).
pub fn build_app(config: &AppConfig) -> Result<(Router, Arc<AppServices>), StoreError> {
    let services = Arc::new(services::build_services(config)?);
    Ok((build_app_with(services.clone()), services))
}

/// Build the router around already-wired services (tests inject stubs here).
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api", routes::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
