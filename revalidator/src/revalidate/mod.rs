//! Webhook delivery processing.
//!
//! One delivery is handled start to finish by [`handle_delivery`]:
//!
//! ```text
//! verify signature → extract post codenames → resolve paths → revalidate paths
//! ```
//!
//! Each step either hands its result to the next or settles the [`Outcome`].

pub mod origin;

use futures::future::join_all;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::kontent::{ContentLookup, WebhookPayload};
use crate::web::signature::{canonicalize_payload, verify_kontent_signature};
use crate::Config;

pub use origin::{OriginRevalidator, PageCache, RevalidateError};

/// An inbound webhook delivery as received on the wire.
#[derive(Debug, Clone, Copy)]
pub struct Delivery<'a> {
    /// Value of the `x-kc-signature` header, if sent
    pub signature: Option<&'a str>,
    /// Raw request body
    pub body: &'a [u8],
}

/// How a delivery was settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Signature missing, mismatched, or not computable
    Unauthorized,
    /// Authenticated, but the body lacks `data.items`
    Malformed,
    /// No post items in the delivery
    NothingToRevalidate,
    /// These codenames did not resolve; nothing was revalidated
    InvalidCodenames(Vec<String>),
    /// At least one path failed to revalidate
    Failed(Vec<String>),
    /// Every path was revalidated
    Revalidated(Vec<String>),
}

/// Result of resolving one codename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { codename: String, path: String },
    Unresolved { codename: String },
}

/// Build the public path of a post.
pub fn post_path(prefix: &str, slug: &str) -> String {
    format!("{}/{}", prefix, slug)
}

/// Process a single webhook delivery.
pub async fn handle_delivery(
    config: &Config,
    lookup: &dyn ContentLookup,
    cache: &dyn PageCache,
    delivery: Delivery<'_>,
) -> Outcome {
    let body = match authenticate(config, delivery) {
        Some(body) => body,
        None => return Outcome::Unauthorized,
    };

    let payload: WebhookPayload = match serde_json::from_value(body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "revalidate_payload_malformed");
            return Outcome::Malformed;
        }
    };

    let codenames = payload.post_codenames();

    info!(
        operation = ?payload.operation(),
        item_count = payload.data.items.len(),
        post_count = codenames.len(),
        "revalidate_payload_extracted"
    );

    if codenames.is_empty() {
        return Outcome::NothingToRevalidate;
    }

    let resolutions = resolve_paths(lookup, &config.post_path_prefix, &codenames).await;

    let paths = match collect_paths(resolutions) {
        Ok(paths) => paths,
        Err(unresolved) => {
            warn!(codenames = ?unresolved, "revalidate_invalid_codenames");
            return Outcome::InvalidCodenames(unresolved);
        }
    };

    let errors = revalidate_paths(cache, &paths).await;

    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        error!(
            error = %messages.join("; "),
            failed = messages.len(),
            attempted = paths.len(),
            "revalidate_failed"
        );
        return Outcome::Failed(messages);
    }

    info!(revalidated = %paths.join(", "), "revalidate_complete");

    Outcome::Revalidated(paths)
}

/// Verify the delivery signature, returning the parsed body only when it is
/// authentic. Nothing in the body is trusted before this returns.
fn authenticate(config: &Config, delivery: Delivery<'_>) -> Option<Value> {
    if !config.is_signature_verification_enabled() {
        warn!("revalidate_secret_not_configured");
        return None;
    }

    let signature = match delivery.signature {
        Some(s) => s,
        None => {
            warn!("revalidate_signature_missing");
            return None;
        }
    };

    let body: Value = match serde_json::from_slice(delivery.body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, body_length = delivery.body.len(), "revalidate_body_not_json");
            return None;
        }
    };

    let payload = match canonicalize_payload(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "revalidate_canonicalize_failed");
            return None;
        }
    };

    let secret = config.webhook_secret.as_deref().unwrap_or_default();

    if !verify_kontent_signature(&payload, secret, signature) {
        warn!("revalidate_signature_invalid");
        return None;
    }

    Some(body)
}

/// Resolve one codename to the path of its post.
async fn resolve_path(lookup: &dyn ContentLookup, prefix: &str, codename: &str) -> Resolution {
    match lookup.find_post_slug(codename).await {
        Ok(Some(slug)) => Resolution::Resolved {
            codename: codename.to_string(),
            path: post_path(prefix, &slug),
        },
        Ok(None) => {
            warn!(codename = %codename, "revalidate_codename_not_found");
            Resolution::Unresolved {
                codename: codename.to_string(),
            }
        }
        Err(e) => {
            warn!(codename = %codename, error = %e, "revalidate_lookup_failed");
            Resolution::Unresolved {
                codename: codename.to_string(),
            }
        }
    }
}

/// Resolve all codenames concurrently, keeping input order in the result.
pub async fn resolve_paths(
    lookup: &dyn ContentLookup,
    prefix: &str,
    codenames: &[String],
) -> Vec<Resolution> {
    let futures: Vec<_> = codenames
        .iter()
        .map(|codename| resolve_path(lookup, prefix, codename))
        .collect();

    join_all(futures).await
}

/// All resolved paths, or every codename that failed to resolve.
pub fn collect_paths(resolutions: Vec<Resolution>) -> Result<Vec<String>, Vec<String>> {
    let mut paths = Vec::with_capacity(resolutions.len());
    let mut unresolved = Vec::new();

    for resolution in resolutions {
        match resolution {
            Resolution::Resolved { path, .. } => paths.push(path),
            Resolution::Unresolved { codename } => unresolved.push(codename),
        }
    }

    if unresolved.is_empty() {
        Ok(paths)
    } else {
        Err(unresolved)
    }
}

/// Revalidate all paths concurrently, returning the failures.
pub async fn revalidate_paths(cache: &dyn PageCache, paths: &[String]) -> Vec<RevalidateError> {
    let futures: Vec<_> = paths.iter().map(|path| cache.revalidate(path)).collect();

    join_all(futures)
        .await
        .into_iter()
        .filter_map(Result::err)
        .collect()
}
