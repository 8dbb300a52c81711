//! # Bridge Configuration
//!
//! Polling cadences, attempt budgets and event-channel sizing for the bridge.
//! Every field has a default matching the behaviour portals expect from the
//! embedded component scripts, so an empty configuration is valid.
//!
//! ## Sources (later wins)
//!
//! 1. Built-in defaults
//! 2. `config/portlet-bridge.toml`
//! 3. `config/portlet-bridge.{environment}.toml`
//! 4. `PORTLET_BRIDGE_*` environment variables (`__` separates nesting,
//!    e.g. `PORTLET_BRIDGE_IDLE__POLL_INTERVAL_MS=5`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use portlet_hub_bridge::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let attempts = manager.config().readiness.max_attempts;
//! let interval = manager.config().idle.poll_interval();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::{defaults, hub_events};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring portlet-bridge.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Readiness gate used while waiting for page scripts
    pub readiness: ReadinessConfig,

    /// Idle-gated executor cadence
    pub idle: IdleConfig,

    /// Lifecycle event publishing
    pub events: EventsConfig,

    /// Hub event names used by the relay
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Maximum number of times the readiness condition is checked
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl ReadinessConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::READINESS_MAX_ATTEMPTS,
            interval_ms: defaults::READINESS_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IdleConfig {
    pub poll_interval_ms: u64,
}

impl IdleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::IDLE_POLL_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Capacity of the lifecycle broadcast channel
    pub channel_capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            channel_capacity: defaults::EVENT_CHANNEL_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Hub notification the placeholder listener subscribes to at establishment
    pub state_change_event: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            state_change_event: hub_events::STATE_CHANGE.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Reject values that would make a poll loop spin or never run
    pub fn validate(&self) -> ConfigResult<()> {
        if self.readiness.max_attempts == 0 {
            return Err(ConfigurationError::invalid_value(
                "readiness.max_attempts",
                "0",
                "at least one readiness check is required",
            ));
        }
        if self.readiness.interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "readiness.interval_ms",
                "0",
                "readiness retries must be scheduled, not spun",
            ));
        }
        if self.idle.poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "idle.poll_interval_ms",
                "0",
                "idle polls must be scheduled, not spun",
            ));
        }
        if self.events.channel_capacity == 0 {
            return Err(ConfigurationError::invalid_value(
                "events.channel_capacity",
                "0",
                "broadcast channels need a non-zero capacity",
            ));
        }
        if self.relay.state_change_event.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "relay.state_change_event",
                "",
                "state change event name must not be blank",
            ));
        }
        Ok(())
    }
}
