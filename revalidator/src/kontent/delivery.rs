//! Content lookup against the Kontent Delivery API.
//!
//! The handler only needs one thing from the CMS: the slug of a post given its
//! codename. [`ContentLookup`] is that seam; [`DeliveryClient`] implements it
//! over HTTP and can be shared across concurrent lookups.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use super::types::DeliveryItemResponse;
use crate::Config;

/// Errors raised while looking up a content item.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("delivery request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("delivery api returned status {status} for {codename}")]
    Status { codename: String, status: u16 },

    #[error("content item {0} has no slug")]
    MissingSlug(String),

    #[error("invalid delivery url: {0}")]
    InvalidBaseUrl(String),

    #[error("project id is not configured")]
    MissingProjectId,
}

/// Resolves a post codename to its URL slug.
#[async_trait]
pub trait ContentLookup: Send + Sync {
    /// Returns `Ok(None)` when no item with this codename exists.
    async fn find_post_slug(&self, codename: &str) -> Result<Option<String>, LookupError>;
}

/// Delivery API client.
#[derive(Clone)]
pub struct DeliveryClient {
    client: Client,
    base_url: Url,
    project_id: String,
    preview_api_key: Option<String>,
}

impl DeliveryClient {
    /// Create a client for the given base URL and project.
    pub fn new(
        client: Client,
        base_url: &str,
        project_id: impl Into<String>,
        preview_api_key: Option<String>,
    ) -> Result<Self, LookupError> {
        let project_id = project_id.into();
        if project_id.is_empty() {
            return Err(LookupError::MissingProjectId);
        }

        let base_url =
            Url::parse(base_url).map_err(|_| LookupError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            project_id,
            preview_api_key,
        })
    }

    /// Create a client from application configuration.
    pub fn from_config(client: Client, config: &Config) -> Result<Self, LookupError> {
        Self::new(
            client,
            &config.delivery_url,
            config.project_id.clone(),
            config.preview_api_key.clone(),
        )
    }

    /// URL of a single item; the codename is encoded as one path segment.
    fn item_url(&self, codename: &str) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend([self.project_id.as_str(), "items", codename]);
        Ok(url)
    }
}

#[async_trait]
impl ContentLookup for DeliveryClient {
    async fn find_post_slug(&self, codename: &str) -> Result<Option<String>, LookupError> {
        let url = self.item_url(codename)?;
        debug!(codename = %codename, url = %url, "delivery_item_fetch_starting");

        let mut request = self.client.get(url);
        if let Some(key) = &self.preview_api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            info!(codename = %codename, "delivery_item_not_found");
            return Ok(None);
        }

        if !status.is_success() {
            return Err(LookupError::Status {
                codename: codename.to_string(),
                status: status.as_u16(),
            });
        }

        let body: DeliveryItemResponse = response.json().await?;
        let slug = body
            .item
            .slug()
            .ok_or_else(|| LookupError::MissingSlug(codename.to_string()))?
            .to_string();

        debug!(
            codename = %codename,
            item_type = %body.item.system.item_type,
            slug = %slug,
            "delivery_item_fetch_complete"
        );

        Ok(Some(slug))
    }
}
