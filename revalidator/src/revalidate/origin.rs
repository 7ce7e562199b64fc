//! Page regeneration against the rendering origin.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

use crate::Config;

/// Header the origin checks before regenerating a page on demand.
pub const REVALIDATE_HEADER: &str = "x-prerender-revalidate";

/// Response headers reporting what the origin's page cache did.
pub const CACHE_STATUS_HEADERS: [&str; 2] = ["x-nextjs-cache", "x-vercel-cache"];

/// Cache status reported when the page was regenerated.
pub const REVALIDATED: &str = "REVALIDATED";

/// Errors raised while marking a path stale.
#[derive(Debug, Error)]
pub enum RevalidateError {
    #[error("revalidation request for {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("origin rejected revalidation of {path} with status {status}")]
    Rejected { path: String, status: u16 },

    #[error("origin did not regenerate {path} (cache status {cache:?})")]
    NotRevalidated { path: String, cache: Option<String> },

    #[error("revalidate token is not configured")]
    MissingToken,
}

/// Marks cached output for a path stale so the next request regenerates it.
#[async_trait]
pub trait PageCache: Send + Sync {
    async fn revalidate(&self, path: &str) -> Result<(), RevalidateError>;
}

/// Regenerates pages by requesting them from the site origin with the
/// revalidation token attached.
#[derive(Clone)]
pub struct OriginRevalidator {
    client: Client,
    origin: String,
    token: String,
}

impl OriginRevalidator {
    pub fn new(
        client: Client,
        origin: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, RevalidateError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(RevalidateError::MissingToken);
        }

        let origin = origin.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            origin,
            token,
        })
    }

    pub fn from_config(client: Client, config: &Config) -> Result<Self, RevalidateError> {
        let token = config
            .revalidate_token
            .clone()
            .ok_or(RevalidateError::MissingToken)?;
        Self::new(client, config.site_origin.clone(), token)
    }
}

/// First cache status header present on the response.
fn cache_status(headers: &HeaderMap) -> Option<String> {
    CACHE_STATUS_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}

#[async_trait]
impl PageCache for OriginRevalidator {
    async fn revalidate(&self, path: &str) -> Result<(), RevalidateError> {
        let url = format!("{}{}", self.origin, path);

        let request = self
            .client
            .head(&url)
            .header(REVALIDATE_HEADER, self.token.as_str());

        match request.send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();

                if !resp.status().is_success() {
                    error!(path = %path, status_code = status, "origin_revalidate_rejected");
                    return Err(RevalidateError::Rejected {
                        path: path.to_string(),
                        status,
                    });
                }

                // A 2xx may still be a cached copy
                let cache = cache_status(resp.headers());
                if !cache
                    .as_deref()
                    .map(|c| c.eq_ignore_ascii_case(REVALIDATED))
                    .unwrap_or(false)
                {
                    error!(
                        path = %path,
                        status_code = status,
                        cache = ?cache,
                        "origin_revalidate_not_regenerated"
                    );
                    return Err(RevalidateError::NotRevalidated {
                        path: path.to_string(),
                        cache,
                    });
                }

                info!(path = %path, status_code = status, "origin_revalidate_complete");
                Ok(())
            }
            Err(e) => {
                if e.is_timeout() {
                    error!(path = %path, error = %e, "origin_revalidate_timeout");
                } else {
                    error!(path = %path, error = %e, "origin_revalidate_error");
                }
                Err(RevalidateError::Request {
                    path: path.to_string(),
                    source: e,
                })
            }
        }
    }
}
