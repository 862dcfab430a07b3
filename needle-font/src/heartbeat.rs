//! Progress lines while a slow blocking step runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Background ticker that logs elapsed time until stopped or dropped.
pub struct Heartbeat {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    beats: Arc<AtomicU64>,
}

impl Heartbeat {
    pub fn start(label: impl Into<String>, interval: Duration) -> Self {
        let label = label.into();
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let beats = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&beats);

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval_at(started + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        counter.fetch_add(1, Ordering::Relaxed);
                        log::info!("{label}… ({}s elapsed)", started.elapsed().as_secs());
                    }
                }
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            beats,
        }
    }

    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }

    /// Stops the ticker and waits for it to finish.
    pub async fn stop(mut self) -> u64 {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        self.beats()
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}
