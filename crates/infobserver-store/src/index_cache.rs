//! The Postgres-backed [`IndexCache`] implementation (spec §4.2). Dedup
//! writes use `ON CONFLICT DO NOTHING` against a `UNIQUE(source, source_id)`
//! constraint (§6) rather than a bulk-copy-then-ignore-duplicates approach.

use std::collections::HashSet;

use async_trait::async_trait;
use diesel::prelude::*;
use infobserver_core::error::IndexCacheError;
use infobserver_core::{IndexCache, SourceTag};

use crate::pool::DbPool;
use crate::schema::index_cache::dsl;

pub struct PostgresIndexCache {
    pool: DbPool,
}

impl PostgresIndexCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_cache_err<E: std::fmt::Display>(err: E) -> IndexCacheError {
    IndexCacheError::Query(err.to_string())
}

#[async_trait]
impl IndexCache for PostgresIndexCache {
    async fn known(&self, source: SourceTag) -> Result<HashSet<String>, IndexCacheError> {
        let mut conn = self.pool.get().map_err(to_cache_err)?;
        let source_tag = source.as_str().to_string();

        let ids: Vec<String> = tokio::task::spawn_blocking(move || {
            dsl::index_cache
                .filter(dsl::source.eq(source_tag))
                .select(dsl::source_id)
                .load(&mut conn)
        })
        .await
        .map_err(to_cache_err)?
        .map_err(to_cache_err)?;

        Ok(ids.into_iter().collect())
    }

    async fn remember(&self, source: SourceTag, external_ids: &[String]) -> Result<(), IndexCacheError> {
        if external_ids.is_empty() {
            return Ok(());
        }
        let mut conn = self.pool.get().map_err(to_cache_err)?;
        let rows: Vec<(String, String)> = external_ids
            .iter()
            .map(|id| (source.as_str().to_string(), id.clone()))
            .collect();

        tokio::task::spawn_blocking(move || {
            diesel::insert_into(dsl::index_cache)
                .values(
                    rows.iter()
                        .map(|(source, source_id)| {
                            (dsl::source.eq(source.clone()), dsl::source_id.eq(source_id.clone()))
                        })
                        .collect::<Vec<_>>(),
                )
                .on_conflict((dsl::source, dsl::source_id))
                .do_nothing()
                .execute(&mut conn)
        })
        .await
        .map_err(to_cache_err)?
        .map_err(to_cache_err)?;

        Ok(())
    }
}
