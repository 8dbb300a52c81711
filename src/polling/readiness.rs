//! # Readiness Gate
//!
//! Bounded, scheduled polling of a dependency's initialization marker. Each
//! retry is a timer sleep, so the runtime stays responsive between checks.

use crate::config::ReadinessConfig;
use crate::error::{BridgeError, BridgeResult};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ReadinessGate {
    max_attempts: u32,
    interval: Duration,
}

impl ReadinessGate {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    pub fn from_config(config: &ReadinessConfig) -> Self {
        Self::new(config.max_attempts, config.interval())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until `condition` holds, checking it at most `max_attempts` times.
    ///
    /// Returns the attempt on which the condition held.
    pub async fn wait_until_ready<C>(
        &self,
        dependency: &str,
        mut condition: C,
        cancel: &CancellationToken,
    ) -> BridgeResult<u32>
    where
        C: FnMut() -> bool + Send,
    {
        for attempt in 1..=self.max_attempts {
            if condition() {
                debug!(dependency = %dependency, attempt, "✅ Dependency ready");
                return Ok(attempt);
            }
            if attempt == self.max_attempts {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(BridgeError::cancelled(format!("readiness of {dependency}")));
                }
                _ = sleep(self.interval) => {}
            }
        }

        warn!(
            dependency = %dependency,
            attempts = self.max_attempts,
            interval = ?self.interval,
            "⏳ Dependency not ready, giving up"
        );
        Err(BridgeError::DependencyNotReady {
            dependency: dependency.to_string(),
            reason: format!("not ready after {} attempts", self.max_attempts),
        })
    }

    /// Run `on_ready` once `condition` holds.
    ///
    /// Exhaustion is logged and reported as `false`; `on_ready` is then never run.
    pub async fn run_when_ready<C, F>(&self, dependency: &str, condition: C, on_ready: F) -> bool
    where
        C: FnMut() -> bool + Send,
        F: FnOnce() + Send,
    {
        match self
            .wait_until_ready(dependency, condition, &CancellationToken::new())
            .await
        {
            Ok(_) => {
                on_ready();
                true
            }
            Err(error) => {
                crate::logging::log_error(
                    "readiness_gate",
                    "run_when_ready",
                    &error.to_string(),
                    Some(dependency),
                );
                false
            }
        }
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::from_config(&ReadinessConfig::default())
    }
}
