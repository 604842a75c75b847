use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to acquire a pooled connection: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("blocking task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("redis backend error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialize(String),
}
