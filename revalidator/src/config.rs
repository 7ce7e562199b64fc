//! Configuration module for environment variable parsing.
//!
//! The binary reads the environment once at startup; everything downstream
//! receives an explicit [`Config`] so handlers can be exercised with any
//! secret or origin without touching process state.

use std::env;
use tracing::warn;

/// Public Delivery API endpoint.
pub const DELIVERY_URL: &str = "https://deliver.kontent.ai";

/// Preview Delivery API endpoint, used when a preview key is configured.
pub const PREVIEW_DELIVERY_URL: &str = "https://preview-deliver.kontent.ai";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret used to verify `x-kc-signature`
    pub webhook_secret: Option<String>,

    /// Kontent project (environment) identifier
    pub project_id: String,

    /// Optional preview API key; switches lookups to unpublished content
    pub preview_api_key: Option<String>,

    /// Base URL of the Delivery API, without trailing slash
    pub delivery_url: String,

    /// Origin of the site whose pages are regenerated
    pub site_origin: String,

    /// Token sent in `x-prerender-revalidate` to the site origin
    pub revalidate_token: Option<String>,

    /// Path prefix under which posts are rendered
    pub post_path_prefix: String,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let preview_api_key = parse_optional("KONTENT_PREVIEW_API_KEY");

        let default_delivery_url = if preview_api_key.is_some() {
            PREVIEW_DELIVERY_URL
        } else {
            DELIVERY_URL
        };

        Config {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            webhook_secret: parse_optional("KONTENT_WEBHOOK_SECRET"),

            project_id: env::var("KONTENT_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),

            preview_api_key,

            delivery_url: parse_base_url("KONTENT_DELIVERY_URL", default_delivery_url),

            site_origin: parse_base_url("SITE_ORIGIN", "http://localhost:3000"),

            revalidate_token: parse_optional("REVALIDATE_TOKEN"),

            post_path_prefix: parse_path_prefix("POST_PATH_PREFIX", "/posts"),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8000),
        }
    }

    /// Whether deliveries can be authenticated at all.
    pub fn is_signature_verification_enabled(&self) -> bool {
        self.webhook_secret
            .as_ref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false)
    }
}

/// Read a variable, treating blank values as unset.
fn parse_optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a base URL, dropping any trailing slashes.
fn parse_base_url(name: &str, default: &str) -> String {
    let raw = parse_optional(name).unwrap_or_else(|| default.to_string());
    let trimmed = raw.trim_end_matches('/');

    if url::Url::parse(trimmed).is_err() {
        warn!(env_var = name, value = %raw, "Invalid URL, using default");
        return default.to_string();
    }

    trimmed.to_string()
}

/// Read a path prefix, normalized to a leading slash and no trailing slash.
fn parse_path_prefix(name: &str, default: &str) -> String {
    let raw = match parse_optional(name) {
        Some(v) => v,
        None => return default.to_string(),
    };

    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }

    format!("/{}", trimmed)
}
