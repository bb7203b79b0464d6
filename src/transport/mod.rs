pub mod memory;

pub use memory::InMemoryTransport;

use std::time::Duration;

use async_trait::async_trait;

use crate::core::{Command, Result};

/// Boundary to the messaging provider (SQS/SNS in the original deployment).
///
/// The supplier core never talks to a broker directly; everything goes
/// through these three calls. Implementations must be safe to share across
/// tasks behind an `Arc`.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Long-poll `queue` for up to `wait_time`, returning at most
    /// `max_messages` commands.
    ///
    /// The read is destructive: every returned message is removed from the
    /// queue before this call returns, whether or not the caller acts on
    /// it. An empty queue yields an empty vec after the wait elapses, not
    /// an error.
    async fn receive_and_remove(
        &self,
        queue: &str,
        max_messages: usize,
        wait_time: Duration,
    ) -> Result<Vec<Command>>;

    /// Publish `payload` to the broadcast topic. Returns the message id.
    async fn publish(&self, topic: &str, payload: &str) -> Result<String>;

    /// Put a command body on `queue`, optionally hidden for `delay` before
    /// it becomes receivable. Returns the message id.
    async fn enqueue(&self, queue: &str, body: &str, delay: Option<Duration>) -> Result<String>;
}
