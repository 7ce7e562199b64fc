//! In-memory collaborators and helpers shared by the test modules.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Barrier;

use crate::config::DELIVERY_URL;
use crate::kontent::{ContentLookup, LookupError};
use crate::revalidate::{PageCache, RevalidateError};
use crate::web::signature::{canonicalize_payload, sign_payload};
use crate::Config;

pub const TEST_SECRET: &str = "test-webhook-secret";

pub fn test_config() -> Config {
    Config {
        port: 0,
        webhook_secret: Some(TEST_SECRET.to_string()),
        project_id: "test-project".to_string(),
        preview_api_key: None,
        delivery_url: DELIVERY_URL.to_string(),
        site_origin: "http://localhost:3000".to_string(),
        revalidate_token: Some("test-revalidate-token".to_string()),
        post_path_prefix: "/posts".to_string(),
        request_timeout_ms: 1000,
    }
}

/// Serialize `body` compactly and sign it the way Kontent would.
pub fn signed_delivery(body: &Value, config: &Config) -> (Vec<u8>, String) {
    let raw = serde_json::to_vec(body).unwrap();
    let canonical = canonicalize_payload(body).unwrap();
    let signature = sign_payload(&canonical, config.webhook_secret.as_deref().unwrap()).unwrap();
    (raw, signature)
}

/// Lookup backed by a codename → slug map, recording every call.
pub struct StubLookup {
    slugs: HashMap<String, String>,
    failing: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubLookup {
    pub fn new(slugs: &[(&str, &str)]) -> Self {
        Self {
            slugs: slugs
                .iter()
                .map(|(c, s)| (c.to_string(), s.to_string()))
                .collect(),
            failing: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make lookups of `codename` return an error.
    pub fn failing_on(mut self, codename: &str) -> Self {
        self.failing = Some(codename.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentLookup for StubLookup {
    async fn find_post_slug(&self, codename: &str) -> Result<Option<String>, LookupError> {
        self.calls.lock().unwrap().push(codename.to_string());

        if self.failing.as_deref() == Some(codename) {
            return Err(LookupError::Status {
                codename: codename.to_string(),
                status: 500,
            });
        }

        Ok(self.slugs.get(codename).cloned())
    }
}

/// Page cache that records every path it is asked to revalidate.
pub struct RecordingCache {
    failing: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self {
            failing: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make revalidation of `path` fail.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing = Some(path.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageCache for RecordingCache {
    async fn revalidate(&self, path: &str) -> Result<(), RevalidateError> {
        self.calls.lock().unwrap().push(path.to_string());

        if self.failing.as_deref() == Some(path) {
            return Err(RevalidateError::Rejected {
                path: path.to_string(),
                status: 500,
            });
        }

        Ok(())
    }
}

/// Lookup whose calls all wait on a shared barrier before answering, so it
/// only completes when every lookup is in flight at once.
pub struct BarrierLookup {
    barrier: Arc<Barrier>,
}

impl BarrierLookup {
    pub fn new(parties: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

#[async_trait]
impl ContentLookup for BarrierLookup {
    async fn find_post_slug(&self, codename: &str) -> Result<Option<String>, LookupError> {
        self.barrier.wait().await;
        Ok(Some(format!("{}-slug", codename)))
    }
}

/// Page cache whose calls all wait on a shared barrier before succeeding.
pub struct BarrierCache {
    barrier: Arc<Barrier>,
}

impl BarrierCache {
    pub fn new(parties: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(parties)),
        }
    }
}

#[async_trait]
impl PageCache for BarrierCache {
    async fn revalidate(&self, _path: &str) -> Result<(), RevalidateError> {
        self.barrier.wait().await;
        Ok(())
    }
}

/// Lookup that answers each codename after its own delay and records the
/// order in which answers complete.
pub struct DelayedLookup {
    delays: HashMap<String, Duration>,
    completed: Mutex<Vec<String>>,
}

impl DelayedLookup {
    pub fn new(delays: &[(&str, u64)]) -> Self {
        Self {
            delays: delays
                .iter()
                .map(|(c, ms)| (c.to_string(), Duration::from_millis(*ms)))
                .collect(),
            completed: Mutex::new(Vec::new()),
        }
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentLookup for DelayedLookup {
    async fn find_post_slug(&self, codename: &str) -> Result<Option<String>, LookupError> {
        let delay = match self.delays.get(codename) {
            Some(d) => *d,
            None => return Ok(None),
        };

        tokio::time::sleep(delay).await;
        self.completed.lock().unwrap().push(codename.to_string());
        Ok(Some(format!("{}-slug", codename)))
    }
}
