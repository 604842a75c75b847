//! Maps a registry tag to a concrete [`Source`] constructor (spec §4.4).
//! No GitLab entry exists here: it's out of scope (spec §A.7).

use std::sync::Arc;

use infobserver_core::{Config, IndexCache, SourceTag};

use crate::csv::CsvSource;
use crate::github::GithubSource;
use crate::gist::GistSource;
use crate::pastebin::PastebinSource;
use crate::source::{Source, SourceError};

/// Builds every configured source into a ready-to-spawn [`Source`] trait
/// object. Fails fast (spec §4.4) on an unrecognized tag rather than
/// skipping it silently.
pub fn build_sources(
    config: &Config,
    index_cache: Arc<dyn IndexCache>,
    client: reqwest::Client,
) -> Result<Vec<Arc<dyn Source>>, SourceError> {
    let mut sources: Vec<Arc<dyn Source>> = Vec::with_capacity(config.sources.len());

    for (tag, source_config) in &config.sources {
        let interval = source_config.effective_interval(config.global_scrape_interval);
        let source: Arc<dyn Source> = match SourceTag::parse(tag) {
            Some(SourceTag::Gist) => Arc::new(GistSource::new(
                source_config,
                interval,
                index_cache.clone(),
                client.clone(),
            )),
            Some(SourceTag::Pastebin) => Arc::new(PastebinSource::new(
                source_config,
                interval,
                index_cache.clone(),
                client.clone(),
            )),
            Some(SourceTag::GithubPublicEvents) => Arc::new(GithubSource::new(
                source_config,
                interval,
                index_cache.clone(),
                client.clone(),
            )),
            Some(SourceTag::Csv) => Arc::new(CsvSource::new(source_config)?),
            None => return Err(SourceError::UnknownTag(tag.clone())),
        };
        sources.push(source);
    }

    Ok(sources)
}
