use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::core::{Command, Result};
use crate::transport::Transport;

/// Default receive batch size when no override is given.
pub const DEFAULT_MAX_MESSAGES: usize = 5;

/// Default long-poll wait.
pub const DEFAULT_WAIT_TIME: Duration = Duration::from_secs(20);

/// Hard cap on a single receive batch, matching the provider limit.
pub const MAX_BATCH: usize = 10;

/// Destructively polls the control queue for pending commands.
///
/// Every message returned by `poll` has already been removed from the
/// queue, so a command is consumed even if the caller subsequently fails to
/// act on it. The long-poll wait is the control loop's only pacing.
pub struct QueueConsumer<T: Transport> {
    transport: Arc<T>,
    queue: String,
    max_messages: usize,
    wait_time: Duration,
}

impl<T: Transport> QueueConsumer<T> {
    pub fn new(transport: Arc<T>, queue: &str) -> Self {
        Self {
            transport,
            queue: queue.to_string(),
            max_messages: DEFAULT_MAX_MESSAGES,
            wait_time: DEFAULT_WAIT_TIME,
        }
    }

    /// Set the receive batch size, clamped to the provider cap.
    pub fn max_messages(mut self, max: usize) -> Self {
        self.max_messages = max.min(MAX_BATCH);
        self
    }

    /// Set the long-poll wait.
    pub fn wait_time(mut self, wait: Duration) -> Self {
        self.wait_time = wait;
        self
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Long-poll once. An empty vec means the wait elapsed with nothing
    /// pending; a transport failure is fatal to the process.
    pub async fn poll(&self) -> Result<Vec<Command>> {
        let batch = self
            .transport
            .receive_and_remove(&self.queue, self.max_messages, self.wait_time)
            .await?;
        if !batch.is_empty() {
            debug!("received {} command(s) from '{}'", batch.len(), self.queue);
        }
        Ok(batch)
    }
}
