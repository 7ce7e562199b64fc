//! Kontent integration.
//!
//! This module provides:
//! - Webhook delivery and Delivery API message types
//! - The content lookup seam and its Delivery API client

pub mod delivery;
pub mod types;

pub use delivery::{ContentLookup, DeliveryClient, LookupError};
pub use types::{
    ContentItem, DeliveryItemResponse, WebhookItem, WebhookMessage, WebhookPayload, POST_TYPE,
};
