//! Processing queue contract (spec §4.1).
//!
//! [`Queue`] is implemented twice: [`SimpleQueue`] here (purely in-process,
//! an `asyncio.Queue`-style bounded FIFO with task-done accounting) and
//! `infobserver_store::ExternalQueue` (broker-backed, `notify`/`join` as
//! no-ops). Consumers depend only on this trait and never branch on which
//! variant they were handed — selection happens once, at wiring time, in
//! the orchestrator (spec §4.1 "Selection rule").

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::QueueError;

/// A bounded FIFO hand-off between one-or-more producers and exactly one
/// consumer.
#[async_trait]
pub trait Queue<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Inserts `item`, waiting if the queue is at capacity.
    async fn put(&self, item: T) -> Result<(), QueueError>;

    /// Inserts `item` without waiting; fails with [`QueueError::QueueFull`] if
    /// the queue is at capacity.
    async fn try_put(&self, item: T) -> Result<(), QueueError>;

    /// Removes and returns the next item, waiting if the queue is empty.
    async fn get(&self) -> T;

    /// Removes and returns the next item without waiting; fails with
    /// [`QueueError::QueueEmpty`] if none is available.
    async fn try_get(&self) -> Result<T, QueueError>;

    /// The number of items currently queued.
    async fn depth(&self) -> usize;

    /// The configured capacity (`0` means unbounded).
    fn max_size(&self) -> usize;

    /// Marks one previously-`get`-ed item as fully processed. Each `get`
    /// should be paired with exactly one `notify` call.
    fn notify(&self);

    /// Blocks until every item ever `put` has been `notify`-ed.
    async fn join(&self);
}

/// Purely in-process queue variant, used whenever no external broker is
/// configured (spec §4.1 "Selection rule").
pub struct SimpleQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Notify,
    not_full: Notify,
    all_done: Notify,
    max_size: usize,
    unfinished: AtomicUsize,
}

impl<T> SimpleQueue<T> {
    /// `max_size == 0` means unbounded, matching `asyncio.Queue(maxsize=0)`
    /// semantics.
    pub fn new(max_size: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Notify::new(),
            not_full: Notify::new(),
            all_done: Notify::new(),
            max_size,
            unfinished: AtomicUsize::new(0),
        }
    }
}

impl<T> Default for SimpleQueue<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl<T> Queue<T> for SimpleQueue<T>
where
    T: Send + 'static,
{
    async fn put(&self, item: T) -> Result<(), QueueError> {
        let mut item = Some(item);
        loop {
            {
                let mut guard = self.items.lock().expect("queue mutex poisoned");
                if self.max_size == 0 || guard.len() < self.max_size {
                    guard.push_back(item.take().expect("item already taken"));
                    self.unfinished.fetch_add(1, Ordering::SeqCst);
                    self.not_empty.notify_one();
                    return Ok(());
                }
            }
            self.not_full.notified().await;
        }
    }

    async fn try_put(&self, item: T) -> Result<(), QueueError> {
        let mut guard = self.items.lock().expect("queue mutex poisoned");
        if self.max_size != 0 && guard.len() >= self.max_size {
            return Err(QueueError::QueueFull {
                max_size: self.max_size,
            });
        }
        guard.push_back(item);
        self.unfinished.fetch_add(1, Ordering::SeqCst);
        self.not_empty.notify_one();
        Ok(())
    }

    async fn get(&self) -> T {
        loop {
            {
                let mut guard = self.items.lock().expect("queue mutex poisoned");
                if let Some(item) = guard.pop_front() {
                    self.not_full.notify_one();
                    return item;
                }
            }
            self.not_empty.notified().await;
        }
    }

    async fn try_get(&self) -> Result<T, QueueError> {
        let mut guard = self.items.lock().expect("queue mutex poisoned");
        let item = guard.pop_front().ok_or(QueueError::QueueEmpty)?;
        self.not_full.notify_one();
        Ok(item)
    }

    async fn depth(&self) -> usize {
        self.items.lock().expect("queue mutex poisoned").len()
    }

    fn max_size(&self) -> usize {
        self.max_size
    }

    fn notify(&self) {
        let previous = self.unfinished.fetch_sub(1, Ordering::SeqCst);
        if previous == 0 {
            // Mirrors asyncio.Queue.task_done() raising ValueError when called
            // more times than there were items placed in the queue.
            self.unfinished.store(0, Ordering::SeqCst);
            panic!("notify() called more times than items were put");
        }
        if previous == 1 {
            self.all_done.notify_waiters();
        }
    }

    async fn join(&self) {
        loop {
            if self.unfinished.load(Ordering::SeqCst) == 0 {
                return;
            }
            let notified = self.all_done.notified();
            if self.unfinished.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn put_get_round_trip() {
        let queue: SimpleQueue<i32> = SimpleQueue::new(0);
        queue.put(42).await.unwrap();
        assert_eq!(queue.depth().await, 1);
        assert_eq!(queue.get().await, 42);
        assert_eq!(queue.depth().await, 0);
    }

    #[tokio::test]
    async fn try_put_fails_when_full() {
        let queue: SimpleQueue<i32> = SimpleQueue::new(1);
        queue.try_put(1).await.unwrap();
        assert!(matches!(
            queue.try_put(2).await,
            Err(QueueError::QueueFull { max_size: 1 })
        ));
    }

    #[tokio::test]
    async fn try_get_fails_when_empty() {
        let queue: SimpleQueue<i32> = SimpleQueue::new(0);
        assert!(matches!(queue.try_get().await, Err(QueueError::QueueEmpty)));
    }

    #[tokio::test]
    async fn blocking_put_unblocks_after_get() {
        let queue = Arc::new(SimpleQueue::<i32>::new(1));
        queue.put(1).await.unwrap();

        let producer_queue = queue.clone();
        let producer = tokio::spawn(async move {
            producer_queue.put(2).await.unwrap();
        });

        // give the producer a chance to block on a full queue
        tokio::task::yield_now().await;
        assert_eq!(queue.get().await, 1);
        producer.await.unwrap();
        assert_eq!(queue.get().await, 2);
    }

    #[tokio::test]
    async fn notify_pairs_with_get_and_join_unblocks() {
        let queue = Arc::new(SimpleQueue::<i32>::new(0));
        queue.put(1).await.unwrap();
        queue.put(2).await.unwrap();

        let join_queue = queue.clone();
        let joiner = tokio::spawn(async move {
            join_queue.join().await;
        });

        tokio::task::yield_now().await;
        assert!(!joiner.is_finished());

        let _ = queue.get().await;
        queue.notify();
        let _ = queue.get().await;
        queue.notify();

        joiner.await.unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "notify() called more times")]
    async fn notify_without_matching_get_panics() {
        let queue: SimpleQueue<i32> = SimpleQueue::new(0);
        queue.notify();
    }
}
