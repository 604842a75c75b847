//! Storage-backed implementations: the Postgres index cache and sink
//! consumer (spec §4.2, §4.6), and the Redis-backed external queue (§4.1).

pub mod error;
pub mod external_queue;
pub mod index_cache;
pub mod models;
pub mod pool;
pub mod schema;
pub mod sink;

pub use error::StoreError;
pub use external_queue::ExternalQueue;
pub use index_cache::PostgresIndexCache;
pub use pool::{init_pool, DbPool, PoolError};
pub use sink::SinkConsumer;
