//! Insertable row shapes for the `events`/`matches`/`ascii_match` tables
//! (spec §6). The sink only ever writes; nothing in this system reads these
//! tables back, so there is no corresponding `Queryable` side.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema::{ascii_match, events, matches};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEventRow {
    pub source: String,
    pub raw_content: String,
    pub filename: String,
    pub creator: String,
    pub time_created: DateTime<Utc>,
    pub time_discovered: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = matches)]
pub struct NewMatchRow {
    pub event_id: i32,
    pub rule_matched: String,
    pub tags_matched: Vec<String>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ascii_match)]
pub struct NewAsciiMatchRow {
    pub match_id: i32,
    pub matched_string: String,
}
