//! Background idle-session sweeper.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use super::{SessionRegistry, SessionTransport};

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for the task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            error!("Sweeper task failed: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawn a task that sweeps idle sessions every `period`.
///
/// The first sweep happens one full period after spawning.
pub fn spawn_sweeper<T: SessionTransport>(
    registry: Arc<SessionRegistry<T>>,
    period: Duration,
) -> SweeperHandle {
    let (tx, mut rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match registry.sweep_expired() {
                        Ok(0) => debug!(active = registry.len(), "Sweep found no idle sessions"),
                        Ok(n) => info!(purged = n, active = registry.len(), "Purged idle sessions"),
                        Err(e) => error!("Session sweep failed: {}", e),
                    }
                }
                _ = &mut rx => {
                    debug!("Sweeper stopped");
                    break;
                }
            }
        }
    });

    SweeperHandle {
        shutdown: Some(tx),
        task,
    }
}
