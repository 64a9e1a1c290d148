//! Batch sync: fetch regional feeds, classify each item, enrich, upsert.
//!
//! A run is a sequence of independent per-item upserts, not a transaction.
//! One failing source or item is logged and skipped; the run continues.
//! A crash mid-run leaves a partial result, which is safe because upserts
//! are idempotent and the run is externally re-triggered.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::classifier::Classifier;
use crate::pipeline::{enrich, RawItem};
use crate::store::HubStore;

/// A curated regional feed.
pub struct FeedSource {
    pub name: &'static str,
    pub url: &'static str,
}

/// Seed list of regional news and events feeds.
pub const REGION_SOURCES: &[FeedSource] = &[
    FeedSource {
        name: "WFMZ Lehigh Valley",
        url: "https://www.wfmz.com/search/?f=rss&t=article&c=news/lehigh-valley",
    },
    FeedSource {
        name: "Lehigh Valley News Top",
        url: "https://www.lehighvalleynews.com/index.rss",
    },
    FeedSource {
        name: "Discover Lehigh Valley",
        url: "https://www.discoverlehighvalley.com/blog/rss/",
    },
];

#[derive(Debug, Clone)]
pub struct FeedItem {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub published: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse one RSS/Atom feed.
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>>;
}

/// reqwest + feed-rs fetcher.
pub struct HttpFeedFetcher {
    http: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }
}

impl Default for HttpFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedItem>> {
        let bytes = self
            .http
            .get(url)
            .header(reqwest::header::USER_AGENT, "ValleyHub/0.1")
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let feed = feed_rs::parser::parse(bytes.as_ref())?;
        Ok(feed
            .entries
            .into_iter()
            .map(|entry| FeedItem {
                title: entry
                    .title
                    .map(|t| t.content)
                    .unwrap_or_else(|| "Untitled Update".to_string()),
                url: entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default(),
                snippet: entry.summary.map(|t| t.content).unwrap_or_default(),
                published: entry.published.or(entry.updated),
            })
            .collect())
    }
}

/// Run one sync pass over `REGION_SOURCES`. Returns the number of items
/// ingested. Failure isolation is per item, never batch-fatal; retry policy
/// belongs to the caller.
pub async fn run_sync(
    store: &mut HubStore,
    fetcher: &dyn FeedFetcher,
    classifier: &dyn Classifier,
    items_per_source: usize,
) -> Result<u32> {
    let mut ingested = 0u32;

    for source in REGION_SOURCES {
        let items = match fetcher.fetch(source.url).await {
            Ok(items) => items,
            Err(e) => {
                warn!(source = source.name, error = %e, "Failed to fetch feed");
                continue;
            }
        };

        for item in items.into_iter().take(items_per_source) {
            let classification = match classifier.classify(&item.title, &item.snippet).await {
                Ok(c) => c,
                Err(e) => {
                    warn!(source = source.name, url = %item.url, error = %e,
                        "Classification failed, skipping item");
                    continue;
                }
            };

            let raw = RawItem {
                title: item.title,
                body: item.snippet,
                source_url: item.url,
                event_date: item.published.unwrap_or_else(Utc::now),
            };

            let (landmarks, geofences) = store.geo_snapshot().await?;
            let event = enrich(&raw, &classification, &landmarks, &geofences);

            if let Err(e) = store.upsert_event(event).await {
                warn!(source = source.name, error = %e, "Failed to store event");
                continue;
            }
            ingested += 1;
        }
    }

    info!(ingested, "Sync complete");
    Ok(ingested)
}
