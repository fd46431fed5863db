//! Queue keeper
//!
//! Background task that periodically removes jobs whose purge time has
//! passed. Stopped by sending `true` on the shutdown channel (or dropping
//! its sender).

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::QueueConfig;
use crate::service::JobQueue;

/// Periodic purge of expired jobs
pub struct Keeper {
    queue: Arc<JobQueue>,
    interval: Duration,
}

impl Keeper {
    /// Creates a keeper; the interval must be non-zero
    pub fn new(queue: Arc<JobQueue>, interval: Duration) -> anyhow::Result<Self> {
        if interval.is_zero() {
            anyhow::bail!("keeper interval must be greater than 0");
        }
        Ok(Self { queue, interval })
    }

    /// Creates a keeper running at the configured `keeper_interval`
    pub fn from_config(queue: Arc<JobQueue>, config: &QueueConfig) -> anyhow::Result<Self> {
        Self::new(queue, config.keeper_interval)
    }

    /// Runs the keeper on the current tokio runtime
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Purges expired jobs every interval until shutdown is signalled
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting queue keeper (interval: {:?})", self.interval);

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = self.queue.purge_expired(Utc::now());
                    if purged.is_empty() {
                        debug!("No expired jobs");
                    } else {
                        info!("Purged {} expired job(s)", purged.len());
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Queue keeper stopped");
    }
}
