//! Queue backends.

pub mod bounded;

pub use bounded::{submission_queue, Pop, PushError, QueueConsumer, QueueProducer};
