//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Background refresher
//!
//! Drives the orchestrator on a fixed interval and publishes every round,
//! good or bad, to the snapshot store. Each round runs in its own task so a
//! panic in orchestration glue is contained: it is logged and the loop
//! retries after an exponential backoff instead of dying.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::HealthCheckConfig;
use crate::error::{HealthzError, HealthzResult};
use crate::orchestrator::RoundRunner;
use crate::snapshot::SnapshotStore;

/// Grace period granted to the loop on stop
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay schedule after failed rounds
#[derive(Debug, Clone)]
struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            current: base,
        }
    }

    /// Delay to apply now, doubling the next one up to the ceiling
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.base;
    }
}

/// Periodic driver keeping the snapshot store current
pub struct BackgroundRefresher {
    task_handle: Option<JoinHandle<()>>,
    shutdown_signal: watch::Sender<bool>,
}

impl BackgroundRefresher {
    /// Spawn the refresh loop; the first round starts immediately
    pub fn start(
        runner: Arc<dyn RoundRunner>,
        store: SnapshotStore,
        config: &HealthCheckConfig,
    ) -> Self {
        Self::start_with_intervals(runner, store, config.refresh_interval(), config.max_backoff())
    }

    /// Spawn the refresh loop with explicit timings
    pub fn start_with_intervals(
        runner: Arc<dyn RoundRunner>,
        store: SnapshotStore,
        refresh_interval: Duration,
        max_backoff: Duration,
    ) -> Self {
        let (shutdown_signal, shutdown) = watch::channel(false);

        info!(
            "Background refresher started with interval: {:?}",
            refresh_interval
        );

        let handle = tokio::spawn(Self::refresh_loop(
            runner,
            store,
            refresh_interval,
            max_backoff.max(refresh_interval),
            shutdown,
        ));

        Self {
            task_handle: Some(handle),
            shutdown_signal,
        }
    }

    /// Whether the loop task is still alive
    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to exit and wait for it
    pub async fn stop(&mut self) -> HealthzResult<()> {
        let Some(handle) = self.task_handle.take() else {
            return Ok(());
        };

        self.shutdown_signal.send_replace(true);
        let abort_handle = handle.abort_handle();

        match tokio::time::timeout(STOP_TIMEOUT, handle).await {
            Ok(Ok(())) => {
                info!("Background refresher stopped gracefully");
                Ok(())
            }
            Ok(Err(e)) if e.is_cancelled() => Ok(()),
            Ok(Err(e)) => Err(HealthzError::from(e)),
            Err(_) => {
                warn!("Background refresher did not stop within timeout, aborting");
                abort_handle.abort();
                Err(HealthzError::Refresher(
                    "refresher did not stop within timeout".to_string(),
                ))
            }
        }
    }

    async fn refresh_loop(
        runner: Arc<dyn RoundRunner>,
        store: SnapshotStore,
        refresh_interval: Duration,
        max_backoff: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut backoff = Backoff::new(refresh_interval, max_backoff);

        loop {
            let round_runner = Arc::clone(&runner);
            let mut round_task = tokio::spawn(async move { round_runner.run_round().await });

            let outcome = tokio::select! {
                joined = &mut round_task => joined,
                _ = shutdown.changed() => {
                    // Dropping the round aborts its probe tasks
                    round_task.abort();
                    let _ = (&mut round_task).await;
                    break;
                }
            };

            let delay = match outcome {
                Ok(round) => {
                    debug!(
                        "Refresh round {} finished: overall_ok={}",
                        round.sequence, round.overall_ok
                    );
                    store.publish(round);
                    backoff.reset();
                    refresh_interval
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    error!(
                        "Health check round failed: {}; retrying in {:?}",
                        e, delay
                    );
                    delay
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }

            if *shutdown.borrow() {
                break;
            }
        }

        info!("Background refresher stopped");
    }
}

impl Drop for BackgroundRefresher {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}
