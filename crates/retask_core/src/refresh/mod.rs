//! Periodic re-evaluation of task urgency.
//!
//! Urgency depends only on the wall clock, so the list has to be recomputed
//! even when nothing in the store changes. The driver publishes a tick counter
//! on a `watch` channel: a slow consumer only ever sees the latest tick.

use crate::clock::Clock;
use crate::error::AppError;
use crate::model::TaskItem;
use crate::task_api;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshDriver {
    period: Duration,
}

impl Default for RefreshDriver {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

impl RefreshDriver {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start ticking on the current tokio runtime.
    ///
    /// The first tick fires immediately. The task stops once every receiver
    /// has been dropped.
    pub fn spawn(&self) -> (watch::Receiver<u64>, JoinHandle<()>) {
        let (tx, rx) = watch::channel(0u64);
        let period = self.period;

        let handle = tokio::spawn(async move {
            debug!(period_ms = period.as_millis() as u64, "refresh driver started");
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;

            loop {
                interval.tick().await;
                tick += 1;
                if tx.send(tick).is_err() {
                    debug!(tick, "refresh driver has no subscribers, stopping");
                    break;
                }
            }
        });

        (rx, handle)
    }
}

/// The task list as evaluated on one tick.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tick: u64,
    pub now: i64,
    pub tasks: Result<Vec<TaskItem>, AppError>,
}

/// Recomputes the task list from the store on every refresh tick.
pub struct StatusBoard<C> {
    store_path: PathBuf,
    clock: C,
    ticks: watch::Receiver<u64>,
}

impl<C: Clock> StatusBoard<C> {
    pub fn new(store_path: PathBuf, clock: C, ticks: watch::Receiver<u64>) -> Self {
        Self {
            store_path,
            clock,
            ticks,
        }
    }

    /// Wait for the next tick and evaluate against a fresh `now`.
    ///
    /// Returns `None` once the driver has stopped. Store failures are
    /// reported inside the snapshot and not retried here.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.ticks.changed().await.ok()?;
        let tick = *self.ticks.borrow_and_update();
        let now = self.clock.now_millis();
        let tasks = task_api::list_tasks_with_path(&self.store_path, now);

        if let Err(err) = &tasks {
            warn!(tick, error = %err, "failed to refresh task list");
        }

        Some(Snapshot { tick, now, tasks })
    }
}
