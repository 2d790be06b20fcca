//! Periodic refresh of dashboard data
//!
//! Metric panels poll their source on a fixed interval. A failed fetch is
//! logged and skipped until the next tick; there is no retry or backoff.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::StateError;

/// Default polling interval
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Something that can be fetched repeatedly
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    type Output: Send + 'static;

    async fn fetch(&self) -> anyhow::Result<Self::Output>;

    /// Name used in log messages
    fn name(&self) -> &str {
        "refresh"
    }
}

/// Builder for a polling task
pub struct Poller<F> {
    fetcher: F,
    interval: Duration,
}

impl<F: Fetch> Poller<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    /// Set the polling period. A zero period is rejected.
    pub fn with_interval(mut self, interval: Duration) -> Result<Self, StateError> {
        if interval.is_zero() {
            return Err(StateError::InvalidInterval);
        }
        self.interval = interval;
        Ok(self)
    }

    /// Start polling on the current tokio runtime. The first fetch happens
    /// immediately; `on_update` receives every successful result.
    pub fn spawn<U>(self, mut on_update: U) -> PollerHandle
    where
        U: FnMut(F::Output) + Send + 'static,
    {
        let Poller { fetcher, interval } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match fetcher.fetch().await {
                    Ok(output) => on_update(output),
                    Err(e) => {
                        tracing::warn!("{} fetch failed, skipping tick: {:#}", fetcher.name(), e)
                    }
                }
            }
        });

        PollerHandle { task }
    }
}

/// Running poller. Dropping the handle cancels the task.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        // Drop aborts
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
