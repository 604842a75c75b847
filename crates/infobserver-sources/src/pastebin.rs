//! The pastebin producer (spec §4.3, §6 `sources.pastebin`). Polls the
//! scraping API directly through the shared `reqwest::Client`, the way
//! [`crate::gist::GistSource`] calls GitHub's API directly rather than
//! through a vendored SDK.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infobserver_core::{EventPayload, IndexCache, Queue, RawEvent, SourceConfig, SourceTag};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::source::{Source, SourceError};

#[derive(Debug, Deserialize)]
struct PasteApiItem {
    key: String,
    scrape_url: String,
    date: i64,
    size: u64,
    title: String,
}

impl PasteApiItem {
    fn into_raw_event(self) -> RawEvent {
        let created_at = DateTime::from_timestamp(self.date, 0).unwrap_or_else(Utc::now);
        RawEvent {
            source: SourceTag::Pastebin,
            external_id: self.key,
            created_at,
            size: self.size,
            filename: self.title,
            creator: "Anonymous".to_string(),
            payload: EventPayload::Single {
                raw_url: Some(self.scrape_url),
                raw_content: None,
            },
        }
    }
}

pub struct PastebinSource {
    dev_key: Option<String>,
    index_cache: Arc<dyn IndexCache>,
    client: reqwest::Client,
    poll_interval: Duration,
    base_url: String,
}

impl PastebinSource {
    pub fn new(
        config: &SourceConfig,
        poll_interval_seconds: u64,
        index_cache: Arc<dyn IndexCache>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            dev_key: config.dev_key.clone(),
            index_cache,
            client,
            poll_interval: Duration::from_secs(poll_interval_seconds),
            base_url: "https://scrape.pastebin.com/api_scraping.php".to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    async fn fetch_cycle(&self) -> Result<Vec<RawEvent>, SourceError> {
        let items: Vec<PasteApiItem> = self
            .client
            .get(&self.base_url)
            .query(&[
                ("limit", "50".to_string()),
                ("dev_key", self.dev_key.clone().unwrap_or_default()),
            ])
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?
            .json()
            .await
            .map_err(|err| SourceError::Decode(err.to_string()))?;
        debug!("pastebin: fetched {} recent pastes", items.len());

        let known = self.index_cache.known(SourceTag::Pastebin).await?;
        let mut fresh_ids = Vec::new();
        let mut candidates = Vec::new();
        for item in items {
            if known.contains(&item.key) {
                continue;
            }
            fresh_ids.push(item.key.clone());
            candidates.push(item.into_raw_event());
        }
        self.index_cache.remember(SourceTag::Pastebin, &fresh_ids).await?;

        let realized = futures_util::future::join_all(candidates.into_iter().map(|mut event| {
            let client = self.client.clone();
            async move {
                event.realize_raw_content(&client).await;
                event
            }
        }))
        .await;

        let events: Vec<RawEvent> = realized.into_iter().filter(|e| e.is_valid_for_matching()).collect();
        debug!("pastebin: {} events sent for processing", events.len());
        Ok(events)
    }
}

#[async_trait]
impl Source for PastebinSource {
    fn name(&self) -> &'static str {
        "pastebin"
    }

    async fn run(&self, raw_queue: Arc<dyn Queue<RawEvent>>) -> Result<(), SourceError> {
        loop {
            match self.fetch_cycle().await {
                Ok(events) => {
                    for event in events {
                        if raw_queue.put(event).await.is_err() {
                            warn!("pastebin: failed to enqueue event");
                        }
                    }
                }
                Err(err) => warn!("pastebin: cycle failed, will retry next interval: {err}"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infobserver_core::InMemoryIndexCache;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> SourceConfig {
        SourceConfig {
            dev_key: Some("key".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn dedups_and_realizes_recent_pastes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api_scraping.php"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "key": "p1",
                    "scrape_url": format!("{}/raw/p1", server.uri()),
                    "date": 1_700_000_000,
                    "size": 42,
                    "title": "dump.txt"
                },
                {
                    "key": "seen",
                    "scrape_url": "http://x/raw",
                    "date": 1_700_000_000,
                    "size": 1,
                    "title": "old.txt"
                }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/raw/.*"))
            .respond_with(ResponseTemplate::new(200).set_body_string("super secret password=hunter2"))
            .mount(&server)
            .await;

        let index_cache = Arc::new(InMemoryIndexCache::new());
        index_cache
            .remember(SourceTag::Pastebin, &["seen".to_string()])
            .await
            .unwrap();

        let source = PastebinSource::new(&config(), 60, index_cache, reqwest::Client::new())
            .with_base_url(format!("{}/api_scraping.php", server.uri()));

        let events = source.fetch_cycle().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].external_id, "p1");
        assert_eq!(events[0].creator, "Anonymous");
    }
}
