//! Bounded FIFO submission queue with blocking, interruptible producers.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{
    bounded, Receiver, SendTimeoutError, Sender, TryRecvError, TrySendError,
};

/// Why a push did not enqueue its item. The item is handed back.
#[derive(Debug)]
pub enum PushError<I> {
    /// The shutdown flag was raised while the producer was blocked.
    Interrupted(I),
    /// The consumer side is gone.
    Closed(I),
}

impl<I> fmt::Display for PushError<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupted(_) => write!(f, "enqueue interrupted by shutdown"),
            Self::Closed(_) => write!(f, "queue closed"),
        }
    }
}

impl<I: fmt::Debug> std::error::Error for PushError<I> {}

impl<I> PushError<I> {
    /// Recover the item that was not enqueued.
    pub fn into_inner(self) -> I {
        match self {
            Self::Interrupted(item) | Self::Closed(item) => item,
        }
    }
}

/// Result of one non-blocking pop.
#[derive(Debug)]
pub enum Pop<I> {
    /// The oldest queued item.
    Item(I),
    /// Nothing is queued right now.
    Empty,
    /// Every producer is gone and the queue is drained.
    Closed,
}

/// Create a queue holding at most `capacity` items.
///
/// A zero capacity yields a rendezvous channel; executor configuration
/// rejects it before the queue is built.
#[must_use]
pub fn submission_queue<I>(capacity: usize) -> (QueueProducer<I>, QueueConsumer<I>) {
    let (tx, rx) = bounded(capacity);
    (QueueProducer { tx, capacity }, QueueConsumer { rx })
}

/// Enqueue side, shared by submitting threads.
#[derive(Debug)]
pub struct QueueProducer<I> {
    tx: Sender<I>,
    capacity: usize,
}

impl<I> Clone for QueueProducer<I> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            capacity: self.capacity,
        }
    }
}

impl<I> QueueProducer<I> {
    /// Enqueue `item`, blocking while the queue is full.
    ///
    /// A blocked producer rechecks `shutdown` every `tick` and gives up once
    /// it is raised.
    ///
    /// # Errors
    ///
    /// [`PushError::Interrupted`] on shutdown, [`PushError::Closed`] if the
    /// consumer was dropped.
    pub fn push(&self, item: I, shutdown: &AtomicBool, tick: Duration) -> Result<(), PushError<I>> {
        let mut item = match self.tx.try_send(item) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(item)) => item,
            Err(TrySendError::Disconnected(item)) => return Err(PushError::Closed(item)),
        };
        tracing::debug!(capacity = self.capacity, "submission queue full, producer blocking");
        loop {
            if shutdown.load(Ordering::Acquire) {
                return Err(PushError::Interrupted(item));
            }
            match self.tx.send_timeout(item, tick) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) => item = back,
                Err(SendTimeoutError::Disconnected(back)) => return Err(PushError::Closed(back)),
            }
        }
    }

    /// Items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Maximum number of queued items.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Dequeue side, owned by the dispatch loop.
#[derive(Debug)]
pub struct QueueConsumer<I> {
    rx: Receiver<I>,
}

impl<I> QueueConsumer<I> {
    /// Take the oldest item without waiting.
    pub fn try_pop(&self) -> Pop<I> {
        match self.rx.try_recv() {
            Ok(item) => Pop::Item(item),
            Err(TryRecvError::Empty) => Pop::Empty,
            Err(TryRecvError::Disconnected) => Pop::Closed,
        }
    }

    /// Items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
