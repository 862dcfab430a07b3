//! Current-stage tracking and the on-demand state dump.

use std::sync::{Mutex, PoisonError};

use engine::Stage;
use tokio::sync::watch;
use tokio::time::Instant;

/// Publishes the pipeline stage so observers can read it without
/// touching pipeline state. Every transition is also kept in order.
#[derive(Debug)]
pub struct StageTracker {
    tx: watch::Sender<Stage>,
    started: Instant,
    history: Mutex<Vec<Stage>>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Stage::Idle);
        Self {
            tx,
            started: Instant::now(),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, stage: Stage) {
        log::debug!("stage: {stage}");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(stage);
        self.tx.send_replace(stage);
    }

    /// Stages entered so far, oldest first.
    pub fn history(&self) -> Vec<Stage> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current(&self) -> Stage {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Stage> {
        self.tx.subscribe()
    }

    pub fn started(&self) -> Instant {
        self.started
    }
}

fn dump(stage: Stage, started: Instant) {
    log::warn!(
        "state dump: stage '{stage}', {:.1}s since start",
        started.elapsed().as_secs_f64()
    );
}

/// Logs the current stage on every SIGUSR1.
#[cfg(unix)]
pub fn install_dump_handler(tracker: &StageTracker) -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut signals = signal(SignalKind::user_defined1())?;
    let stage_rx = tracker.subscribe();
    let started = tracker.started();
    tokio::spawn(async move {
        while signals.recv().await.is_some() {
            dump(*stage_rx.borrow(), started);
        }
    });
    Ok(())
}

#[cfg(not(unix))]
pub fn install_dump_handler(_tracker: &StageTracker) -> std::io::Result<()> {
    Ok(())
}
