//! Wires configuration, sources, the rule-matching consumer and the sink
//! together and runs them forever (spec §2, §4.1 "Selection rule"), over
//! every registered source tag rather than a single hardcoded source.

use std::collections::HashMap;
use std::sync::Arc;

use infobserver_core::{Config, IndexCache, ProcessedEvent, Queue, RawEvent};
use infobserver_rules::RuleMatchingConsumer;
use infobserver_sources::{build_sources, schedule_sources};
use infobserver_store::{init_pool, ExternalQueue, PostgresIndexCache, SinkConsumer};
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] infobserver_core::error::ConfigError),

    #[error("rule engine error: {0}")]
    RuleEngine(#[from] infobserver_rules::RuleEngineError),

    #[error("source producer error: {0}")]
    Source(#[from] infobserver_sources::SourceError),

    #[error("storage layer error: {0}")]
    Store(#[from] infobserver_store::StoreError),

    #[error("connection pool error: {0}")]
    Pool(#[from] infobserver_store::PoolError),

    #[error("queue backend error: {0}")]
    Queue(#[from] infobserver_core::error::QueueError),
}

/// Loads `config_path`, wires the pipeline, and runs it until the process is
/// killed. Never returns `Ok` in ordinary operation (spec §6 "Exit code 0 on
/// normal (never-returning) run").
pub async fn run(config_path: &str) -> Result<(), AppError> {
    let config = Config::load(config_path)?;
    config.validate()?;
    infobserver_core::logging::init_logging(&config.log_level);

    info!("configured sources: {:?}", config.sources.keys().collect::<Vec<_>>());

    let pool = init_pool(&config.postgres.database_url(), config.postgres.pool_size)?;
    let index_cache: Arc<dyn IndexCache> = Arc::new(PostgresIndexCache::new(pool.clone()));

    let (raw_queue, processed_queue) = match &config.redis {
        Some(redis_config) => {
            let raw: Arc<dyn Queue<RawEvent>> = Arc::new(
                ExternalQueue::connect(&redis_config.connection_url(), "raw", config.processing_queue_size)
                    .await?,
            );
            let processed: Arc<dyn Queue<ProcessedEvent>> = Arc::new(
                ExternalQueue::connect(&redis_config.connection_url(), "processed", 0).await?,
            );
            info!("wired external (redis-backed) queues");
            (raw, processed)
        }
        None => {
            let raw: Arc<dyn Queue<RawEvent>> =
                Arc::new(infobserver_core::SimpleQueue::new(config.processing_queue_size));
            let processed: Arc<dyn Queue<ProcessedEvent>> = Arc::new(infobserver_core::SimpleQueue::new(0));
            info!("wired in-process simple queues");
            (raw, processed)
        }
    };

    let ext_vars: HashMap<String, String> = config.yara_external_vars.clone().unwrap_or_default();
    let (matcher, _handle) = RuleMatchingConsumer::new(
        raw_queue.clone(),
        processed_queue.clone(),
        &config.yara_rules_paths,
        ext_vars,
    )?;

    let client = reqwest::Client::new();
    let sources = build_sources(&config, index_cache, client)?;
    let source_handles = schedule_sources(sources, raw_queue);

    let matcher_handle = tokio::spawn(matcher.process());
    let sink_handle = tokio::spawn(SinkConsumer::new(pool, processed_queue).process());

    info!("pipeline running");
    tokio::select! {
        result = matcher_handle => {
            error!("rule-matching consumer task exited unexpectedly: {result:?}");
        }
        result = sink_handle => {
            error!("sink consumer task exited unexpectedly: {result:?}");
        }
    }
    for handle in source_handles {
        handle.abort();
    }

    Ok(())
}
