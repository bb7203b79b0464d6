use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};
use tokio::time::{Instant, sleep};
use uuid::Uuid;

use crate::core::{Command, Result, SupplierError};
use crate::transport::Transport;

/// How often a long-poller re-checks the queue between wakeups.
const RECHECK_INTERVAL: Duration = Duration::from_millis(100);

struct StoredMessage {
    body: String,
    sent_at: DateTime<Utc>,
    visible_at: Instant,
}

/// In-process transport backing the demo binary and the test suites.
///
/// Queues support delayed visibility and destructive long-poll reads;
/// topics keep every published payload so consumers of the feed can be
/// asserted against after the fact.
#[derive(Default)]
pub struct InMemoryTransport {
    queues: Mutex<HashMap<String, VecDeque<StoredMessage>>>,
    topics: Mutex<HashMap<String, Vec<String>>>,
    notify: Notify,
    fail_publishes: AtomicBool,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `publish` fail, to exercise the fatal
    /// transport path.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Enqueue a command with an explicit send timestamp, e.g. one that is
    /// already partway through the work window.
    pub async fn enqueue_with_sent_at(
        &self,
        queue: &str,
        body: &str,
        sent_at: DateTime<Utc>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_default()
            .push_back(StoredMessage {
                body: body.to_string(),
                sent_at,
                visible_at: Instant::now(),
            });
        drop(queues);
        self.notify.notify_waiters();
        id
    }

    /// Payloads published to `topic`, in publish order.
    pub async fn published(&self, topic: &str) -> Vec<String> {
        let topics = self.topics.lock().await;
        topics.get(topic).cloned().unwrap_or_default()
    }

    pub async fn publish_count(&self, topic: &str) -> usize {
        let topics = self.topics.lock().await;
        topics.get(topic).map(|p| p.len()).unwrap_or(0)
    }

    /// Messages currently sitting on `queue`, visible or not.
    pub async fn queue_len(&self, queue: &str) -> usize {
        let queues = self.queues.lock().await;
        queues.get(queue).map(|q| q.len()).unwrap_or(0)
    }

    async fn take_ready(&self, queue: &str, max_messages: usize) -> Vec<Command> {
        let now = Instant::now();
        let mut queues = self.queues.lock().await;
        let mut batch = Vec::new();
        if let Some(pending) = queues.get_mut(queue) {
            let mut i = 0;
            while i < pending.len() && batch.len() < max_messages {
                if pending[i].visible_at <= now {
                    // remove(i) keeps the relative order of what stays behind
                    if let Some(msg) = pending.remove(i) {
                        batch.push(Command::new(msg.body, msg.sent_at));
                    }
                } else {
                    i += 1;
                }
            }
        }
        batch
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn receive_and_remove(
        &self,
        queue: &str,
        max_messages: usize,
        wait_time: Duration,
    ) -> Result<Vec<Command>> {
        let deadline = Instant::now() + wait_time;
        loop {
            let batch = self.take_ready(queue, max_messages).await;
            if !batch.is_empty() {
                return Ok(batch);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(Vec::new());
            }
            let step = RECHECK_INTERVAL.min(deadline - now);
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = sleep(step) => {}
            }
        }
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<String> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(SupplierError::Transport(format!(
                "publish to topic '{}' refused",
                topic
            )));
        }
        let mut topics = self.topics.lock().await;
        topics
            .entry(topic.to_string())
            .or_default()
            .push(payload.to_string());
        Ok(Uuid::new_v4().to_string())
    }

    async fn enqueue(&self, queue: &str, body: &str, delay: Option<Duration>) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let visible_at = match delay {
            Some(delay) => Instant::now() + delay,
            None => Instant::now(),
        };
        let mut queues = self.queues.lock().await;
        queues
            .entry(queue.to_string())
            .or_default()
            .push_back(StoredMessage {
                body: body.to_string(),
                sent_at: Utc::now(),
                visible_at,
            });
        drop(queues);
        self.notify.notify_waiters();
        Ok(id)
    }
}
