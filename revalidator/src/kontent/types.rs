//! Kontent message types.
//!
//! This module defines the formats for:
//! - Webhook deliveries sent by Kontent when content changes
//! - Delivery API responses used to look up a post's slug

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// Content type codename of the items this service revalidates.
pub const POST_TYPE: &str = "post";

// =============================================================================
// Webhook Types
// =============================================================================

/// Body of a Kontent webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub data: WebhookData,
    /// Delivery metadata; only used for logging
    #[serde(default)]
    pub message: Option<WebhookMessage>,
}

/// The changed content of a delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub items: Vec<WebhookItem>,
}

/// One changed content item.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub codename: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Content type codename
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
}

/// Delivery metadata describing what triggered the webhook.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(default)]
    pub created_timestamp: Option<String>,
}

impl WebhookItem {
    /// The codename, if this item is a post with a non-empty codename.
    pub fn post_codename(&self) -> Option<&str> {
        if self.item_type.as_deref() != Some(POST_TYPE) {
            return None;
        }

        self.codename.as_deref().filter(|c| !c.is_empty())
    }
}

impl WebhookPayload {
    /// Codenames of the post items, in delivery order.
    ///
    /// Duplicates are kept.
    pub fn post_codenames(&self) -> Vec<String> {
        self.data
            .items
            .iter()
            .filter_map(WebhookItem::post_codename)
            .map(str::to_string)
            .collect()
    }

    /// Operation that triggered the delivery (e.g. `publish`), if present.
    pub fn operation(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.operation.as_deref())
    }
}

// =============================================================================
// Delivery API Types
// =============================================================================

/// Response of `GET /{project_id}/items/{codename}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryItemResponse {
    pub item: ContentItem,
}

/// A content item as returned by the Delivery API.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentItem {
    pub system: ItemSystem,
    #[serde(default)]
    pub elements: HashMap<String, ItemElement>,
}

/// System attributes of a content item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSystem {
    pub codename: String,
    #[serde(rename = "type")]
    pub item_type: String,
}

/// A single element value. Only the raw value is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemElement {
    #[serde(default)]
    pub value: Value,
}

impl ContentItem {
    /// Value of the `slug` element, when present and non-empty.
    pub fn slug(&self) -> Option<&str> {
        self.elements
            .get("slug")
            .and_then(|e| e.value.as_str())
            .filter(|s| !s.is_empty())
    }
}
