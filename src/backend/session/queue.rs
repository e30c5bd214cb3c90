/**
 * Outbound Sender Queue
 *
 * Per-connection FIFO of outbound messages with inline deduplication at
 * enqueue time. The network sender task drains it; the engine-callback
 * path fills it. The two sides share only this queue's private mutex, so
 * a slow peer never blocks callback processing and callback threads never
 * wait on network I/O.
 *
 * # Deduplication
 *
 * At most one queued message may match a given dedup key (tile identity,
 * indicator-value class, or per-view cursor) at any time. When a newer
 * message arrives for a key that is already queued, the old message is
 * removed and the new one is appended at the tail: the surviving
 * representative moves to most-recently-produced position. Only the
 * newest value of these high-frequency notifications matters to the
 * client; every other command is appended unconditionally.
 *
 * # Stopping
 *
 * `stop()` is one-way. A stopped queue silently drops enqueues and
 * refuses dequeues even when items remain: stop means "cease delivery",
 * not "drain then stop".
 */
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::sync::Notify;

use crate::shared::{DedupKey, OutboundMessage};

/// A queue of messages bound for one session's socket.
#[derive(Debug, Default)]
pub struct SenderQueue {
    queue: Mutex<VecDeque<OutboundMessage>>,
    stopping: AtomicBool,
    wakeup: Notify,
}

impl SenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `stop()` has been called.
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// One-way transition to stopping; idempotent. Stores a wakeup permit
    /// so a sender task that races past the flag check still observes the
    /// stop on its next `wait`.
    pub fn stop(&self) {
        self.stopping.store(true, Ordering::Release);
        self.wakeup.notify_one();
    }

    /// Append a message, evicting a queued message with the same dedup key
    /// first. Returns the post-enqueue length.
    ///
    /// On a stopping queue the message is silently dropped and the current
    /// length returned; the caller cannot rely on delivery confirmation
    /// from this layer either way.
    pub fn enqueue(&self, item: OutboundMessage) -> usize {
        let mut queue = self.queue.lock().unwrap();

        if self.is_stopping() {
            return queue.len();
        }

        let key = item.dedup_key();
        if key != DedupKey::None {
            if let Some(pos) = queue.iter().position(|cur| cur.dedup_key() == key) {
                queue.remove(pos);
            }
        }
        queue.push_back(item);
        let len = queue.len();
        drop(queue);

        self.wakeup.notify_one();
        len
    }

    /// Take the head message, if any. Non-blocking. Returns `None` when
    /// empty or stopping; a stopped queue retains its items but never
    /// yields them.
    pub fn dequeue(&self) -> Option<OutboundMessage> {
        let mut queue = self.queue.lock().unwrap();

        if self.is_stopping() {
            tracing::debug!("SenderQueue: stopping");
            return None;
        }
        queue.pop_front()
    }

    /// Current length. Safe to call concurrently.
    pub fn size(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Wait until a message is enqueued or the queue stops.
    ///
    /// A permit stored by an enqueue that raced ahead of this call makes
    /// it return immediately; callers re-check `dequeue`/`is_stopping` in
    /// a loop rather than assuming state.
    pub async fn wait(&self) {
        self.wakeup.notified().await;
    }
}
