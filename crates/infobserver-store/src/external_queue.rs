//! The broker-backed [`Queue`] variant (spec §4.1), selected instead of
//! `SimpleQueue` whenever `redis:` is present in configuration. `notify` and
//! `join` are no-ops: once an item is pushed, redelivery guarantees become
//! the broker's concern, not ours (spec §9 Open Questions — this crate
//! takes the position that acknowledgement was never meant to be
//! reimplemented on top of a list-backed broker queue, so it is omitted
//! rather than half-built).

use std::marker::PhantomData;

use async_trait::async_trait;
use infobserver_core::error::QueueError;
use infobserver_core::Queue;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

const LIST_KEY_PREFIX: &str = "infobserver:queue:";

pub struct ExternalQueue<T> {
    conn: Mutex<ConnectionManager>,
    list_key: String,
    max_size: usize,
    _marker: PhantomData<T>,
}

impl<T> ExternalQueue<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    pub async fn connect(redis_url: &str, name: &str, max_size: usize) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(|err| QueueError::Backend(err.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|err| QueueError::Backend(err.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
            list_key: format!("{LIST_KEY_PREFIX}{name}"),
            max_size,
            _marker: PhantomData,
        })
    }
}

#[async_trait]
impl<T> Queue<T> for ExternalQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn put(&self, item: T) -> Result<(), QueueError> {
        let payload = bincode::serialize(&item).map_err(|err| QueueError::Backend(err.to_string()))?;
        let mut conn = self.conn.lock().await;
        conn.rpush::<_, _, ()>(&self.list_key, payload)
            .await
            .map_err(|err| QueueError::Backend(err.to_string()))
    }

    /// Non-blocking put, bounded by `max_size` via an `LLEN` check before the
    /// `RPUSH`. Racy under concurrent producers the same way a plain
    /// `LLEN`-then-`RPUSH` always is against a shared list, same as any
    /// check-then-act pair without a transaction around it.
    async fn try_put(&self, item: T) -> Result<(), QueueError> {
        let mut conn = self.conn.lock().await;
        if self.max_size != 0 {
            let len: usize = conn
                .llen(&self.list_key)
                .await
                .map_err(|err| QueueError::Backend(err.to_string()))?;
            if len >= self.max_size {
                return Err(QueueError::QueueFull {
                    max_size: self.max_size,
                });
            }
        }
        let payload = bincode::serialize(&item).map_err(|err| QueueError::Backend(err.to_string()))?;
        conn.rpush::<_, _, ()>(&self.list_key, payload)
            .await
            .map_err(|err| QueueError::Backend(err.to_string()))
    }

    async fn get(&self) -> T {
        loop {
            let popped: Option<Vec<u8>> = {
                let mut conn = self.conn.lock().await;
                let reply: Option<(String, Vec<u8>)> = conn
                    .blpop(&self.list_key, 1.0)
                    .await
                    .unwrap_or(None);
                reply.map(|(_, payload)| payload)
            };
            if let Some(payload) = popped {
                if let Ok(item) = bincode::deserialize(&payload) {
                    return item;
                }
            }
        }
    }

    /// Non-blocking pop via `LPOP`, returning [`QueueError::QueueEmpty`] when
    /// the list is empty rather than waiting.
    async fn try_get(&self) -> Result<T, QueueError> {
        let popped: Option<Vec<u8>> = {
            let mut conn = self.conn.lock().await;
            conn.lpop(&self.list_key, None)
                .await
                .map_err(|err| QueueError::Backend(err.to_string()))?
        };
        let payload = popped.ok_or(QueueError::QueueEmpty)?;
        bincode::deserialize(&payload).map_err(|err| QueueError::Backend(err.to_string()))
    }

    async fn depth(&self) -> usize {
        let mut conn = self.conn.lock().await;
        conn.llen(&self.list_key).await.unwrap_or(0)
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    /// A no-op: redelivery acknowledgement is the broker's concern once an
    /// item has been pushed onto the list (spec §9 Open Questions).
    fn notify(&self) {}

    /// A no-op for the same reason as [`ExternalQueue::notify`] — there is
    /// no unfinished-work counter to drain.
    async fn join(&self) {}
}
