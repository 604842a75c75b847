//! Diesel table definitions for the persisted schema (spec §6).

diesel::table! {
    events (id) {
        id -> Int4,
        source -> Text,
        raw_content -> Text,
        filename -> Text,
        creator -> Text,
        time_created -> Timestamptz,
        time_discovered -> Timestamptz,
    }
}

diesel::table! {
    matches (id) {
        id -> Int4,
        event_id -> Int4,
        rule_matched -> Text,
        tags_matched -> Array<Text>,
    }
}

diesel::table! {
    ascii_match (id) {
        id -> Int4,
        match_id -> Int4,
        matched_string -> Text,
    }
}

diesel::table! {
    index_cache (source, source_id) {
        source -> Text,
        source_id -> Text,
    }
}

diesel::joinable!(matches -> events (event_id));
diesel::joinable!(ascii_match -> matches (match_id));

diesel::allow_tables_to_appear_in_same_query!(events, matches, ascii_match, index_cache);
