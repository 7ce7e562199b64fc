//! HTTP endpoint handlers.
//!
//! The revalidation handler only extracts the signature header and raw body;
//! everything else happens in [`handle_delivery`]. Its [`Outcome`] maps to
//! exactly one response.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::kontent::ContentLookup;
use crate::revalidate::{handle_delivery, Delivery, Outcome, PageCache};
use crate::web::signature::SIGNATURE_HEADER;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub lookup: Arc<dyn ContentLookup>,
    pub cache: Arc<dyn PageCache>,
}

impl AppState {
    pub fn new(
        config: Config,
        lookup: impl ContentLookup + 'static,
        cache: impl PageCache + 'static,
    ) -> Self {
        Self {
            config: Arc::new(config),
            lookup: Arc::new(lookup),
            cache: Arc::new(cache),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Revalidation Webhook
// =============================================================================

/// Error body returned to the webhook sender.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Success body.
#[derive(Serialize)]
pub struct RevalidatedResponse {
    pub revalidated: bool,
}

fn message(status: StatusCode, message: &'static str) -> Response {
    (status, Json(MessageResponse { message })).into_response()
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Unauthorized => message(StatusCode::UNAUTHORIZED, "Invalid signature"),
            Outcome::Malformed => message(StatusCode::BAD_REQUEST, "Malformed webhook payload"),
            Outcome::NothingToRevalidate => StatusCode::NO_CONTENT.into_response(),
            Outcome::InvalidCodenames(_) => message(StatusCode::NOT_FOUND, "Invalid codename(s)"),
            Outcome::Failed(_) => {
                message(StatusCode::INTERNAL_SERVER_ERROR, "Error revalidating")
            }
            Outcome::Revalidated(_) => (
                StatusCode::OK,
                Json(RevalidatedResponse { revalidated: true }),
            )
                .into_response(),
        }
    }
}

/// Kontent webhook endpoint.
///
/// The body is taken as raw bytes so the signature can be checked before any
/// of it is interpreted.
pub async fn revalidate_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    info!(
        body_length = body.len(),
        has_signature = signature.is_some(),
        "revalidate_webhook_received"
    );

    let delivery = Delivery {
        signature,
        body: &body,
    };

    let outcome = handle_delivery(
        &state.config,
        state.lookup.as_ref(),
        state.cache.as_ref(),
        delivery,
    )
    .await;

    info!(outcome = ?outcome, "revalidate_webhook_settled");

    outcome.into_response()
}
