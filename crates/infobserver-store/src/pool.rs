//! Connection pool bootstrap: a `DbPool` type alias and `init_pool`, taking
//! a `database_url` built from [`infobserver_core::config::PostgresConfig`]
//! rather than an environment variable.

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use thiserror::Error;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    Creation(String),
}

pub fn init_pool(database_url: &str, pool_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(pool_size)
        .build(manager)
        .map_err(|err| PoolError::Creation(err.to_string()))
}
