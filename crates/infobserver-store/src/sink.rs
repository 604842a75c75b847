//! The sink consumer (spec §4.6): a single transaction per [`ProcessedEvent`]
//! that inserts the event row, then every match row, then every
//! matched-string row, cascading the `RETURNING id` back into the in-memory
//! graph as it goes (spec §9's back-index assignment, not back-pointers).

use std::sync::Arc;

use diesel::prelude::*;
use infobserver_core::{ProcessedEvent, Queue};
use tracing::{debug, error, info};

use crate::models::{NewAsciiMatchRow, NewEventRow, NewMatchRow};
use crate::pool::DbPool;
use crate::schema::{ascii_match, events, matches};

pub struct SinkConsumer {
    pool: DbPool,
    processed_queue: Arc<dyn Queue<ProcessedEvent>>,
}

impl SinkConsumer {
    pub fn new(pool: DbPool, processed_queue: Arc<dyn Queue<ProcessedEvent>>) -> Self {
        Self { pool, processed_queue }
    }

    /// Consumes the processed queue forever, persisting each event in its
    /// own transaction. A persistence failure is logged and the event is
    /// dropped — it is not retried (spec §7 "Persistence").
    pub async fn process(self) {
        info!("sink consumer started");
        loop {
            let mut event = self.processed_queue.get().await;
            match self.persist(&mut event).await {
                Ok(()) => {
                    debug!(
                        "inserted event from {} source. rule files matched: {}",
                        event.source,
                        event.rules_matched().join(", ")
                    );
                }
                Err(err) => error!("failed to persist processed event: {err}"),
            }
            self.processed_queue.notify();
        }
    }

    async fn persist(&self, event: &mut ProcessedEvent) -> Result<(), crate::error::StoreError> {
        let mut conn = self.pool.get()?;
        let new_event = NewEventRow {
            source: event.source.as_str().to_string(),
            raw_content: event.raw_content.clone(),
            filename: event.filename.clone(),
            creator: event.creator.clone(),
            time_created: event.created_at,
            time_discovered: event.discovered_at,
        };
        let match_rows: Vec<(String, Vec<String>)> = event
            .matches
            .iter()
            .map(|m| (m.rule_name.clone(), m.tags.clone()))
            .collect();
        let matched_strings: Vec<Vec<String>> = event
            .matches
            .iter()
            .map(|m| m.matched_strings.iter().map(|s| s.matched_string.clone()).collect())
            .collect();

        let (event_id, match_ids) = tokio::task::spawn_blocking(move || {
            conn.transaction::<(i32, Vec<i32>), diesel::result::Error, _>(|conn| {
                let event_id: i32 = diesel::insert_into(events::table)
                    .values(&new_event)
                    .returning(events::id)
                    .get_result(conn)?;

                let mut match_ids = Vec::with_capacity(match_rows.len());
                for (index, (rule_matched, tags_matched)) in match_rows.into_iter().enumerate() {
                    let match_id: i32 = diesel::insert_into(matches::table)
                        .values(&NewMatchRow {
                            event_id,
                            rule_matched,
                            tags_matched,
                        })
                        .returning(matches::id)
                        .get_result(conn)?;

                    for matched_string in &matched_strings[index] {
                        diesel::insert_into(ascii_match::table)
                            .values(&NewAsciiMatchRow {
                                match_id,
                                matched_string: matched_string.clone(),
                            })
                            .execute(conn)?;
                    }
                    match_ids.push(match_id);
                }
                Ok((event_id, match_ids))
            })
        })
        .await??;

        event.set_event_id(event_id);
        for (index, match_id) in match_ids.into_iter().enumerate() {
            event.set_match_id(index, match_id);
        }
        Ok(())
    }
}
