//! Web server module for handling Kontent webhooks.
//!
//! This module provides the HTTP surface of the service:
//! - `POST /api/revalidate` verifies a delivery and revalidates post pages
//! - `GET /health` for liveness checks

pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{
    health, revalidate_webhook, AppState, HealthResponse, MessageResponse, RevalidatedResponse,
};
pub use signature::{canonicalize_payload, verify_kontent_signature, SIGNATURE_HEADER};

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/revalidate", post(revalidate_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
