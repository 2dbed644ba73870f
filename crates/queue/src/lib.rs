//! Blocking handoff queues for the transcription pipeline.
//!
//! A queue carries `StreamItem<T>` values: payload items in strict FIFO order,
//! terminated by a single `EndOfStream` sentinel. The producer side never
//! blocks; the consumer side blocks on `get` until something arrives. Fan-out
//! is achieved by constructing one queue per consumer, not by broadcasting
//! inside the queue.

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// A queue payload: either an item or the end-of-stream sentinel.
///
/// Once a consumer has received `EndOfStream` it must exit its loop and not
/// call `get` again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem<T> {
    Item(T),
    EndOfStream,
}

impl<T> StreamItem<T> {
    /// Returns the payload, or `None` for the sentinel.
    pub fn into_item(self) -> Option<T> {
        match self {
            StreamItem::Item(item) => Some(item),
            StreamItem::EndOfStream => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, StreamItem::EndOfStream)
    }
}

/// Producer half of a queue.
pub struct QueueSender<T> {
    tx: Sender<StreamItem<T>>,
}

impl<T> Clone for QueueSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> QueueSender<T> {
    /// Enqueue an item. Never blocks; the backing store is unbounded and
    /// capacity is implicitly limited by the producer's cycle rate.
    ///
    /// Returns false if the consumer is gone.
    pub fn put(&self, item: T) -> bool {
        self.tx.send(StreamItem::Item(item)).is_ok()
    }

    /// Enqueue the end-of-stream sentinel.
    pub fn close(&self) {
        if self.tx.send(StreamItem::EndOfStream).is_err() {
            tracing::debug!("queue consumer already gone at close");
        }
    }
}

/// Consumer half of a queue.
pub struct QueueReceiver<T> {
    rx: Receiver<StreamItem<T>>,
}

impl<T> QueueReceiver<T> {
    /// Block until the next item or the sentinel arrives.
    ///
    /// A disconnected producer is reported as end of stream so consumer loops
    /// always terminate.
    pub fn get(&self) -> StreamItem<T> {
        self.rx.recv().unwrap_or(StreamItem::EndOfStream)
    }

    /// Non-blocking variant for poll-style consumers. `None` means the queue
    /// is currently empty but still open.
    pub fn try_get(&self) -> Option<StreamItem<T>> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(StreamItem::EndOfStream),
        }
    }

    /// Observable emptiness without blocking.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create a new queue.
pub fn queue<T>() -> (QueueSender<T>, QueueReceiver<T>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (QueueSender { tx }, QueueReceiver { rx })
}
