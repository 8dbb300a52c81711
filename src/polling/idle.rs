//! # Idle-Gated Executor
//!
//! Runs a task against a hub handle only once the handle reports that no
//! previously issued operation is outstanding. The gate keeps this process
//! from writing hub state while one of its own operations is in flight; it
//! does not queue callers. Two callers waiting concurrently may both run once
//! idle is observed, and serializing against mutations issued elsewhere is
//! left to the hub.

use crate::error::{BridgeError, BridgeResult};
use crate::substrate::HubHandle;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq)]
enum IdleProbe {
    Idle,
    Busy,
    /// The progress check failed or had no answer; counted as busy
    Unknown(String),
}

#[derive(Debug, Clone)]
pub struct IdleGatedExecutor {
    poll_interval: Duration,
}

impl IdleGatedExecutor {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    pub fn from_config(config: &crate::config::IdleConfig) -> Self {
        Self::new(config.poll_interval())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run `task` on the first poll where `handle` reports idle.
    ///
    /// The task runs in the same scheduling step as the idle observation, so
    /// nothing else on the runtime can slip in between. Cancelling `cancel`
    /// abandons the wait with [`BridgeError::Cancelled`] and the task never runs.
    pub async fn run_when_idle<T, F>(
        &self,
        scope: &str,
        handle: &Arc<dyn HubHandle>,
        cancel: &CancellationToken,
        task: F,
    ) -> BridgeResult<T>
    where
        F: FnOnce(&Arc<dyn HubHandle>) -> T + Send,
    {
        let mut polls: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(BridgeError::cancelled(format!("idle wait for {scope}")));
            }

            polls += 1;
            match Self::probe(handle) {
                IdleProbe::Idle => {
                    trace!(scope = %scope, polls, "Hub idle, running gated task");
                    return Ok(task(handle));
                }
                IdleProbe::Busy => {}
                IdleProbe::Unknown(reason) => {
                    debug!(scope = %scope, polls, reason = %reason, "Hub progress unknown, treating as busy");
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(BridgeError::cancelled(format!("idle wait for {scope}")));
                }
                _ = sleep(self.poll_interval) => {}
            }
        }
    }

    fn probe(handle: &Arc<dyn HubHandle>) -> IdleProbe {
        match panic::catch_unwind(AssertUnwindSafe(|| handle.is_in_progress())) {
            Ok(Ok(Some(false))) => IdleProbe::Idle,
            Ok(Ok(Some(true))) => IdleProbe::Busy,
            Ok(Ok(None)) => IdleProbe::Unknown("progress state undefined".to_string()),
            Ok(Err(error)) => IdleProbe::Unknown(error.to_string()),
            Err(_) => IdleProbe::Unknown("progress check panicked".to_string()),
        }
    }
}

impl Default for IdleGatedExecutor {
    fn default() -> Self {
        Self::from_config(&crate::config::IdleConfig::default())
    }
}
