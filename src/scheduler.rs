// src/scheduler.rs
use log::error;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Drives periodic re-runs of the fetch, build and render chain.
///
/// Each tick runs to completion before the next one is scheduled, so ticks
/// never overlap; a tick slower than the interval simply delays the next
/// one. A failing tick is logged and the schedule continues.
pub struct RefreshScheduler {
    handle: Option<JoinHandle<()>>,
    interval_seconds: Option<u64>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        RefreshScheduler {
            handle: None,
            interval_seconds: None,
        }
    }

    /// Starts the schedule, replacing any running one. The first tick fires
    /// one full interval from now.
    pub fn start<F, Fut>(&mut self, interval_seconds: u64, tick: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if interval_seconds == 0 {
            return Err(Error::InvalidInterval(interval_seconds));
        }
        self.stop();
        let period = Duration::from_secs(interval_seconds);
        self.handle = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(period).await;
                if let Err(err) = tick().await {
                    error!("Refresh tick failed, keeping the schedule: {err}");
                }
            }
        }));
        self.interval_seconds = Some(interval_seconds);
        Ok(())
    }

    /// Cancels any pending tick. Calling this while idle is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.interval_seconds = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.handle.is_some()
    }

    pub fn interval_seconds(&self) -> Option<u64> {
        self.interval_seconds
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        RefreshScheduler::new()
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
