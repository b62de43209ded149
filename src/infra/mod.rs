//! Infrastructure adapters: the bounded submission queue.

pub mod queue;

pub use queue::{submission_queue, Pop, PushError, QueueConsumer, QueueProducer};
