use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::composer::{LineSet, compose};
use crate::core::{Result, SupplierError};
use crate::transport::Transport;

/// Publisher lifecycle as seen by the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherStatus {
    Idle,
    Running,
}

/// State shared between the control loop and the background worker.
///
/// Single producer per field: the control loop stores `remaining_ms` on
/// every arm, the worker decrements it and flips `active` back off when the
/// window runs out. No wider critical section is needed.
struct SharedWindow {
    remaining_ms: AtomicI64,
    active: AtomicBool,
}

struct WorkerSlot {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the single background publishing worker.
///
/// `arm` always refreshes the remaining window; it spawns a worker only
/// when none is active, guarded by a compare-and-set on the `active` flag,
/// so commands arriving faster than the publish cadence never produce a
/// second concurrent worker. A late command extends (or shortens) the
/// in-flight window without restarting the worker.
pub struct PeriodicPublisher<T: Transport> {
    transport: Arc<T>,
    topic: String,
    lines: Arc<LineSet>,
    sleep_interval: Duration,
    shared: Arc<SharedWindow>,
    worker: Mutex<Option<WorkerSlot>>,
    fault_tx: mpsc::UnboundedSender<SupplierError>,
}

impl<T: Transport> PeriodicPublisher<T> {
    /// Returns the publisher plus the receiving end of its fault channel.
    /// A publish failure inside the worker is reported there so the caller
    /// can terminate the process instead of losing the error in the task.
    pub fn new(
        transport: Arc<T>,
        topic: &str,
        lines: LineSet,
        sleep_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SupplierError>) {
        let (fault_tx, fault_rx) = mpsc::unbounded_channel();
        let publisher = Self {
            transport,
            topic: topic.to_string(),
            lines: Arc::new(lines),
            sleep_interval,
            shared: Arc::new(SharedWindow {
                remaining_ms: AtomicI64::new(0),
                active: AtomicBool::new(false),
            }),
            worker: Mutex::new(None),
            fault_tx,
        };
        (publisher, fault_rx)
    }

    /// Re-arm the work window.
    ///
    /// The remaining-duration cell is always overwritten, downward included;
    /// an active worker picks the new value up on its next iteration. A
    /// worker is spawned only on the `false -> true` transition of the
    /// active flag.
    pub async fn arm(&self, remaining: Duration) {
        let remaining_ms = i64::try_from(remaining.as_millis()).unwrap_or(i64::MAX);
        self.shared.remaining_ms.store(remaining_ms, Ordering::SeqCst);

        if self
            .shared
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            info!(
                "arming publisher on '{}' for {} ms (interval {} ms)",
                self.topic,
                remaining_ms,
                self.sleep_interval.as_millis()
            );
            let (stop_tx, stop_rx) = oneshot::channel();
            let handle = tokio::spawn(worker_loop(
                Arc::clone(&self.shared),
                Arc::clone(&self.transport),
                self.topic.clone(),
                Arc::clone(&self.lines),
                self.sleep_interval,
                self.fault_tx.clone(),
                stop_rx,
            ));
            let mut slot = self.worker.lock().await;
            *slot = Some(WorkerSlot { stop_tx, handle });
        } else {
            debug!("publisher already running, window updated to {} ms", remaining_ms);
        }
    }

    pub fn status(&self) -> PublisherStatus {
        if self.shared.active.load(Ordering::SeqCst) {
            PublisherStatus::Running
        } else {
            PublisherStatus::Idle
        }
    }

    /// Remaining window as last observed; zero when idle or exhausted.
    pub fn remaining(&self) -> Duration {
        let ms = self.shared.remaining_ms.load(Ordering::SeqCst).max(0);
        Duration::from_millis(ms as u64)
    }

    /// Wait for the current worker, if any, to run its window to natural
    /// completion.
    pub async fn join(&self) -> Result<()> {
        let slot = self.worker.lock().await.take();
        if let Some(slot) = slot {
            slot.handle
                .await
                .map_err(|err| SupplierError::InterruptedWait(format!("worker join: {}", err)))?;
        }
        Ok(())
    }

    /// Signal the worker to stop and wait for it to finish. Only used for
    /// shutdown; re-arming never interrupts an in-flight worker.
    pub async fn shutdown(&self) -> Result<()> {
        self.shared.active.store(false, Ordering::SeqCst);
        let slot = self.worker.lock().await.take();
        if let Some(WorkerSlot { stop_tx, handle }) = slot {
            let _ = stop_tx.send(());
            handle
                .await
                .map_err(|err| SupplierError::InterruptedWait(format!("worker join: {}", err)))?;
        }
        Ok(())
    }
}

impl<T: Transport> Drop for PeriodicPublisher<T> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.worker.try_lock() {
            if let Some(slot) = slot.take() {
                slot.handle.abort();
            }
        }
    }
}

async fn worker_loop<T: Transport>(
    shared: Arc<SharedWindow>,
    transport: Arc<T>,
    topic: String,
    lines: Arc<LineSet>,
    sleep_interval: Duration,
    fault_tx: mpsc::UnboundedSender<SupplierError>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let interval_ms = i64::try_from(sleep_interval.as_millis()).unwrap_or(i64::MAX);
    loop {
        let remaining = shared.remaining_ms.load(Ordering::SeqCst);
        if remaining <= 0 || !shared.active.load(Ordering::SeqCst) {
            break;
        }
        debug!("remaining work window: {} ms", remaining);

        let payload = compose(lines.lines());
        match transport.publish(&topic, &payload).await {
            Ok(id) => debug!("published message {}", id),
            Err(err) => {
                error!("publish to '{}' failed: {}", topic, err);
                let _ = fault_tx.send(err);
                break;
            }
        }

        tokio::select! {
            _ = &mut stop_rx => break,
            _ = sleep(sleep_interval) => {}
        }
        shared.remaining_ms.fetch_sub(interval_ms, Ordering::SeqCst);
    }
    shared.active.store(false, Ordering::SeqCst);
    info!("work window finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::InMemoryTransport;

    const INTERVAL: Duration = Duration::from_secs(10);

    fn sample_publisher(
        transport: Arc<InMemoryTransport>,
    ) -> (
        PeriodicPublisher<InMemoryTransport>,
        mpsc::UnboundedReceiver<SupplierError>,
    ) {
        let lines = LineSet::from_lines(vec!["51.5074,-0.1278".to_string()]);
        PeriodicPublisher::new(transport, "events", lines, INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_publishes_ceil_of_window_over_interval() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(Arc::clone(&transport));

        publisher.arm(Duration::from_millis(115_000)).await;
        assert_eq!(publisher.status(), PublisherStatus::Running);
        publisher.join().await.unwrap();

        assert_eq!(transport.publish_count("events").await, 12);
        assert_eq!(publisher.status(), PublisherStatus::Idle);
        assert_eq!(publisher.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_multiple_window() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(Arc::clone(&transport));

        publisher.arm(Duration::from_millis(30_000)).await;
        publisher.join().await.unwrap();

        assert_eq!(transport.publish_count("events").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_window_publishes_nothing() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(Arc::clone(&transport));

        publisher.arm(Duration::ZERO).await;
        publisher.join().await.unwrap();

        assert_eq!(transport.publish_count("events").await, 0);
        assert_eq!(publisher.status(), PublisherStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_while_running_spawns_no_second_worker() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(Arc::clone(&transport));

        publisher.arm(Duration::from_millis(115_000)).await;
        publisher.arm(Duration::from_millis(115_000)).await;
        publisher.join().await.unwrap();

        // two workers would have doubled this
        assert_eq!(transport.publish_count("events").await, 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_downward_rearm_shortens_inflight_window() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(Arc::clone(&transport));

        publisher.arm(Duration::from_secs(3_600)).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        publisher.arm(Duration::from_millis(15_000)).await;
        publisher.join().await.unwrap();

        // worker observed the shortened window instead of running an hour
        let published = transport.publish_count("events").await;
        assert!(published >= 1 && published <= 4, "published {}", published);
        assert_eq!(publisher.status(), PublisherStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_after_natural_finish_spawns_fresh_worker() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(Arc::clone(&transport));

        publisher.arm(Duration::from_millis(10_000)).await;
        publisher.join().await.unwrap();
        assert_eq!(transport.publish_count("events").await, 1);

        publisher.arm(Duration::from_millis(20_000)).await;
        publisher.join().await.unwrap();
        assert_eq!(transport.publish_count("events").await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_failure_reports_fault_and_idles() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, mut faults) = sample_publisher(Arc::clone(&transport));
        transport.fail_publishes(true);

        publisher.arm(Duration::from_millis(60_000)).await;
        publisher.join().await.unwrap();

        let fault = faults.recv().await.unwrap();
        assert!(matches!(fault, SupplierError::Transport(_)));
        assert_eq!(publisher.status(), PublisherStatus::Idle);
        assert_eq!(transport.publish_count("events").await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_worker_early() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(Arc::clone(&transport));

        publisher.arm(Duration::from_secs(3_600)).await;
        tokio::time::sleep(Duration::from_secs(15)).await;
        publisher.shutdown().await.unwrap();

        assert_eq!(publisher.status(), PublisherStatus::Idle);
        let published = transport.publish_count("events").await;
        assert!(published < 10, "published {}", published);
    }

    #[tokio::test]
    async fn test_join_without_worker_is_noop() {
        let transport = Arc::new(InMemoryTransport::new());
        let (publisher, _faults) = sample_publisher(transport);
        publisher.join().await.unwrap();
        publisher.shutdown().await.unwrap();
    }
}
