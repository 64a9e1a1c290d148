//! Fixture implementations for deterministic tests: no network, no database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use valleyhub_common::{Category, Classification, Place};

use crate::classifier::Classifier;
use crate::snapshot::SnapshotStore;
use crate::sync::{FeedFetcher, FeedItem};

// --- MemorySnapshotStore ---

/// In-memory key-value backend. Clones share the same underlying map, so a
/// second store instance can restore what the first persisted.
#[derive(Default, Clone)]
pub struct MemorySnapshotStore {
    data: Arc<Mutex<HashMap<String, Value>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.data.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }
}

// --- FailingSnapshotStore ---

/// Backend whose writes always fail. Reads succeed empty, so the store
/// loads and mutates in memory before the durable write surfaces an error.
pub struct FailingSnapshotStore;

#[async_trait]
impl SnapshotStore for FailingSnapshotStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>> {
        Ok(None)
    }

    async fn put(&self, key: &str, _value: Value) -> Result<()> {
        Err(anyhow!("durable write refused for {key}"))
    }
}

// --- FixtureClassifier ---

/// Canned classifications keyed by exact title, with a generic default.
pub struct FixtureClassifier {
    by_title: HashMap<String, Classification>,
    fail_titles: Vec<String>,
}

impl FixtureClassifier {
    pub fn new() -> Self {
        Self {
            by_title: HashMap::new(),
            fail_titles: Vec::new(),
        }
    }

    pub fn with(mut self, title: &str, classification: Classification) -> Self {
        self.by_title.insert(title.to_string(), classification);
        self
    }

    /// Titles whose classification should error, to exercise item-level
    /// failure isolation.
    pub fn failing_on(mut self, title: &str) -> Self {
        self.fail_titles.push(title.to_string());
        self
    }
}

impl Default for FixtureClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for FixtureClassifier {
    async fn classify(&self, title: &str, _body: &str) -> Result<Classification> {
        if self.fail_titles.iter().any(|t| t == title) {
            return Err(anyhow!("classification timed out"));
        }
        Ok(self
            .by_title
            .get(title)
            .cloned()
            .unwrap_or_else(|| Classification {
                summary: format!("Regional update: {title}."),
                venue: "Various Locations".to_string(),
                place: Place::GreaterValley,
                neighborhood: None,
                category: Category::News,
            }))
    }
}

// --- FixtureFeedFetcher ---

/// Canned feeds keyed by URL. Unknown URLs behave like a failed fetch.
pub struct FixtureFeedFetcher {
    feeds: HashMap<String, Vec<FeedItem>>,
}

impl FixtureFeedFetcher {
    pub fn new() -> Self {
        Self {
            feeds: HashMap::new(),
        }
    }

    pub fn with(mut self, url: &str, items: Vec<FeedItem>) -> Self {
        self.feeds.insert(url.to_string(), items);
        self
    }
}

impl Default for FixtureFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for FixtureFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>> {
        self.feeds
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("no fixture feed for {url}"))
    }
}
