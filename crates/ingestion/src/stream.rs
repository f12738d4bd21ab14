//! Bounded stream channel with drop-newest backpressure
//!
//! The producer is the SDK callback thread and must never block, so a full
//! channel discards the item being sent. Every discard is counted.

use std::sync::atomic::{AtomicU64, Ordering};

use async_channel::{bounded, Receiver, Sender, TrySendError};
use metrics::counter;
use tracing::{trace, warn};

/// Result of a non-blocking send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Item enqueued
    Sent,
    /// Channel full, item discarded
    Dropped,
    /// Channel closed, item discarded
    Closed,
}

/// Bounded multi-producer / multi-consumer channel
///
/// Receivers obtained from [`BoundedStream::receiver`] share one queue:
/// each item is delivered to exactly one of them. After [`close`], queued
/// items stay receivable and `recv` reports end-of-stream once drained.
///
/// [`close`]: BoundedStream::close
#[derive(Debug)]
pub struct BoundedStream<T> {
    name: &'static str,
    tx: Sender<T>,
    rx: Receiver<T>,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl<T> BoundedStream<T> {
    /// Create a stream holding at most `capacity` items
    ///
    /// # Panics
    /// If `capacity` is zero.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self {
            name,
            tx,
            rx,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Enqueue without blocking, discarding `item` if the channel is full
    #[inline]
    pub fn try_send(&self, item: T) -> SendOutcome {
        match self.tx.try_send(item) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                trace!(stream = self.name, "item sent");
                SendOutcome::Sent
            }
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                counter!("livox_stream_dropped_total", "stream" => self.name).increment(1);
                // First drop, then every power of two, so a stalled consumer cannot flood the log.
                if dropped.is_power_of_two() {
                    warn!(stream = self.name, dropped, "stream full, dropping newest item");
                } else {
                    trace!(stream = self.name, dropped, "stream full, dropping newest item");
                }
                SendOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                trace!(stream = self.name, "stream closed, discarding item");
                SendOutcome::Closed
            }
        }
    }

    /// Receive-only handle onto the queue
    pub fn receiver(&self) -> Receiver<T> {
        self.rx.clone()
    }

    /// Close the stream
    ///
    /// Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    /// Items currently queued
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Items successfully enqueued so far
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Items discarded because the channel was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
