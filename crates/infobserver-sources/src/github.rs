//! The github-public-events producer (spec §4.3, §6 `sources.github-public-events`).
//!
//! Each push event becomes one [`RawEvent`] with a `Composite` payload: every
//! commit's file list is resolved, blacklisted extensions are dropped, and
//! the remaining files' content is fetched before the event is ever
//! assembled (spec §3 CompositeEvent, §4.3 item 5).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use infobserver_core::{is_blacklisted_extension, ChildFile, EventPayload, IndexCache, Queue, RawEvent, SourceConfig, SourceTag};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::source::{Source, SourceError};

const API_VERSION: &str = "application/vnd.github.v3+json";
const BAD_CREDENTIALS: &str = "Bad credentials";

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct PushCommit {
    url: String,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(default)]
    commits: Vec<PushCommit>,
}

#[derive(Debug, Deserialize)]
struct Actor {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GithubApiEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created_at: String,
    actor: Actor,
    payload: PushPayload,
}

#[derive(Debug, Deserialize)]
struct CommitFile {
    filename: String,
    raw_url: String,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    files: Vec<CommitFile>,
}

pub struct GithubSource {
    oauth_token: Option<String>,
    index_cache: Arc<dyn IndexCache>,
    client: reqwest::Client,
    poll_interval: Duration,
    base_url: String,
}

impl GithubSource {
    pub fn new(
        config: &SourceConfig,
        poll_interval_seconds: u64,
        index_cache: Arc<dyn IndexCache>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            oauth_token: config.oauth.clone(),
            index_cache,
            client,
            poll_interval: Duration::from_secs(poll_interval_seconds),
            base_url: "https://api.github.com/events".to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Resolves one commit's file list and fetches the content of every
    /// non-blacklisted file, skipping files whose extension is blacklisted
    /// before ever issuing the tertiary GET (spec §4.3 item 5).
    async fn resolve_commit(&self, commit: PushCommit) -> Vec<ChildFile> {
        let detail: CommitDetail = match self.client.get(&commit.url).send().await {
            Ok(resp) => match resp.json().await {
                Ok(detail) => detail,
                Err(err) => {
                    warn!("github: failed to decode commit detail {}: {err}", commit.url);
                    return Vec::new();
                }
            },
            Err(err) => {
                warn!("github: dropped commit url {}: {err}", commit.url);
                return Vec::new();
            }
        };

        let mut children = Vec::new();
        for file in detail.files {
            if is_blacklisted_extension(&file.filename) {
                continue;
            }
            let raw_content = match self.client.get(&file.raw_url).send().await {
                Ok(resp) => resp.text().await.ok(),
                Err(err) => {
                    warn!("github: dropped raw url {} ({}): {err}", file.raw_url, file.filename);
                    None
                }
            };
            children.push(ChildFile {
                filename: file.filename,
                raw_content,
            });
        }
        children
    }

    async fn fetch_cycle(&self) -> Result<Vec<RawEvent>, SourceError> {
        let bytes = self
            .client
            .get(&self.base_url)
            .header("User-Agent", "Infobserver")
            .header("Accept", API_VERSION)
            .header(
                "Authorization",
                format!("token {}", self.oauth_token.as_deref().unwrap_or_default()),
            )
            .send()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?
            .bytes()
            .await
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        if let Ok(error_response) = serde_json::from_slice::<ErrorResponse>(&bytes) {
            if error_response.message == BAD_CREDENTIALS {
                return Err(SourceError::BadCredentials {
                    source: "github-public-events".to_string(),
                });
            }
        }

        let events: Vec<GithubApiEvent> =
            serde_json::from_slice(&bytes).map_err(|err| SourceError::Decode(err.to_string()))?;

        let push_events: Vec<GithubApiEvent> = events
            .into_iter()
            .filter(|event| event.event_type == "PushEvent")
            .collect();
        debug!("github: {} push events of recent public events", push_events.len());

        let known = self.index_cache.known(SourceTag::GithubPublicEvents).await?;
        let mut fresh_ids = Vec::new();
        let mut fresh_events = Vec::new();
        for event in push_events {
            if known.contains(&event.id) {
                continue;
            }
            fresh_ids.push(event.id.clone());
            fresh_events.push(event);
        }
        self.index_cache
            .remember(SourceTag::GithubPublicEvents, &fresh_ids)
            .await?;

        let mut composites = Vec::with_capacity(fresh_events.len());
        for event in fresh_events {
            let created_at = DateTime::parse_from_rfc3339(&event.created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            let mut children = Vec::new();
            for commit in event.payload.commits {
                children.extend(self.resolve_commit(commit).await);
            }
            composites.push(RawEvent {
                source: SourceTag::GithubPublicEvents,
                external_id: event.id,
                created_at,
                size: 0,
                filename: String::new(),
                creator: event.actor.login,
                payload: EventPayload::Composite { children },
            });
        }

        let events: Vec<RawEvent> = composites
            .into_iter()
            .filter(|e| e.is_valid_for_matching())
            .collect();
        debug!("github: {} commit-stream events sent for processing", events.len());
        Ok(events)
    }
}

#[async_trait]
impl Source for GithubSource {
    fn name(&self) -> &'static str {
        "github-public-events"
    }

    async fn run(&self, raw_queue: Arc<dyn Queue<RawEvent>>) -> Result<(), SourceError> {
        loop {
            match self.fetch_cycle().await {
                Ok(events) => {
                    for event in events {
                        if raw_queue.put(event).await.is_err() {
                            warn!("github: failed to enqueue event");
                        }
                    }
                }
                Err(err @ SourceError::BadCredentials { .. }) => return Err(err),
                Err(err) => warn!("github: cycle failed, will retry next interval: {err}"),
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infobserver_core::InMemoryIndexCache;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> SourceConfig {
        SourceConfig {
            oauth: Some("token123".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn bad_credentials_terminates_the_producer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": "Bad credentials"
            })))
            .mount(&server)
            .await;

        let source = GithubSource::new(
            &config(),
            60,
            Arc::new(InMemoryIndexCache::new()),
            reqwest::Client::new(),
        )
        .with_base_url(format!("{}/events", server.uri()));

        let result = source.fetch_cycle().await;
        assert!(matches!(result, Err(SourceError::BadCredentials { .. })));
    }

    #[tokio::test]
    async fn push_event_fans_out_to_one_child_per_commit_after_blacklist_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "id": "push-1",
                    "type": "PushEvent",
                    "created_at": "2024-01-01T00:00:00Z",
                    "actor": {"login": "octocat"},
                    "payload": {
                        "commits": [
                            {"url": format!("{}/commits/c1", server.uri())},
                            {"url": format!("{}/commits/c2", server.uri())}
                        ]
                    }
                }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/commits/c1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [
                    {"filename": "a.rb", "raw_url": format!("{}/raw/a.rb", server.uri())},
                    {"filename": "logo.png", "raw_url": format!("{}/raw/logo.png", server.uri())}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/commits/c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [
                    {"filename": "b.rb", "raw_url": format!("{}/raw/b.rb", server.uri())},
                    {"filename": "archive.zip", "raw_url": format!("{}/raw/archive.zip", server.uri())}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/a.rb"))
            .respond_with(ResponseTemplate::new(200).set_body_string("puts 1"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/b.rb"))
            .respond_with(ResponseTemplate::new(200).set_body_string("puts 2"))
            .mount(&server)
            .await;

        let source = GithubSource::new(
            &config(),
            60,
            Arc::new(InMemoryIndexCache::new()),
            reqwest::Client::new(),
        )
        .with_base_url(format!("{}/events", server.uri()));

        let events = source.fetch_cycle().await.unwrap();
        assert_eq!(events.len(), 1);
        let units = events[0].match_units();
        assert_eq!(units.len(), 2);
        let filenames: Vec<&str> = units.iter().map(|u| u.filename.as_str()).collect();
        assert!(filenames.contains(&"a.rb"));
        assert!(filenames.contains(&"b.rb"));
        assert!(!filenames.contains(&"logo.png"));
        assert!(!filenames.contains(&"archive.zip"));
    }
}
