use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::info;
use tokio::sync::mpsc;

use crate::composer::LineSet;
use crate::config::SupplierConfig;
use crate::consumer::QueueConsumer;
use crate::core::{Command, Result, SupplierError};
use crate::publisher::PeriodicPublisher;
use crate::transport::Transport;
use crate::window::compute_remaining;

/// Why the control loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// A quit command was received; the process should exit with success.
    Terminated,
}

/// The control loop: polls the control queue, terminates on the quit token
/// and otherwise re-arms the periodic publisher from the freshest command.
///
/// There is no sleep of its own — the consumer's long-poll provides all the
/// pacing, so an empty batch loops straight back into the next poll.
pub struct Supplier<T: Transport> {
    consumer: QueueConsumer<T>,
    publisher: PeriodicPublisher<T>,
    faults: mpsc::UnboundedReceiver<SupplierError>,
    full_window: Duration,
}

impl<T: Transport> Supplier<T> {
    pub fn new(transport: Arc<T>, config: &SupplierConfig, lines: LineSet) -> Self {
        let consumer = QueueConsumer::new(Arc::clone(&transport), &config.control_queue)
            .max_messages(config.max_messages)
            .wait_time(config.wait_time);
        let (publisher, faults) =
            PeriodicPublisher::new(transport, &config.topic, lines, config.sleep_interval);
        Self {
            consumer,
            publisher,
            faults,
            full_window: config.full_window,
        }
    }

    pub fn publisher(&self) -> &PeriodicPublisher<T> {
        &self.publisher
    }

    /// Run until a quit command arrives (clean termination) or a fault
    /// surfaces from the consumer or the publishing worker (fatal).
    pub async fn run(&mut self) -> Result<LoopOutcome> {
        info!("polling control queue '{}'", self.consumer.queue());
        loop {
            tokio::select! {
                Some(fault) = self.faults.recv() => {
                    return Err(fault);
                }
                batch = self.consumer.poll() => {
                    let batch = batch?;
                    if batch.is_empty() {
                        continue;
                    }
                    if batch.iter().any(Command::is_quit) {
                        // quit wins over anything else in the same batch
                        info!("quit command received, terminating");
                        return Ok(LoopOutcome::Terminated);
                    }
                    let remaining = compute_remaining(&batch, self.full_window, Utc::now());
                    self.publisher.arm(remaining).await;
                }
            }
        }
    }
}
