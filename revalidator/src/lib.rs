//! Kontent revalidator - on-demand page regeneration for a Kontent-backed site.
//!
//! Kontent calls the webhook whenever content changes. Deliveries are
//! authenticated, post codenames are resolved to public paths through the
//! Delivery API, and the site origin is asked to regenerate those paths.
//!
//! ## Flow
//!
//! ```text
//! Kontent webhook → Web Server → Delivery API (slug lookup) → Site origin (revalidate)
//! ```

pub mod config;
pub mod kontent;
pub mod revalidate;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::Config;
pub use kontent::{ContentLookup, DeliveryClient, LookupError, WebhookPayload};
pub use revalidate::{
    handle_delivery, Delivery, OriginRevalidator, Outcome, PageCache, RevalidateError,
};
pub use web::{app, AppState};
