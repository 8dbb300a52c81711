//! Error types for the portlet hub bridge.
//!

use crate::config::ConfigurationError;
use crate::models::ComponentInstanceId;
use crate::state_machine::{RegistrationEvent, RegistrationPhase};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// A readiness poll gave up before its dependency became available
    #[error("Dependency '{dependency}' not ready: {reason}")]
    DependencyNotReady { dependency: String, reason: String },

    /// Fire, state-mutation or inbound relay requested before any hub channel exists
    #[error("No hub channel established for portlet {instance_id}")]
    ChannelNotEstablished { instance_id: ComponentInstanceId },

    /// One of the hub's primitives rejected
    #[error("Hub operation '{operation}' failed: {reason}")]
    SubstrateOperationFailed { operation: String, reason: String },

    #[error("No <{tag}> element with data-portlet-id '{instance_id}'")]
    ElementNotFound {
        tag: String,
        instance_id: ComponentInstanceId,
    },

    #[error("No client runtime registered for application '{app_id}'")]
    ClientNotFound { app_id: String },

    #[error("Portlet {instance_id} already has a channel entry")]
    InstanceAlreadyExists { instance_id: ComponentInstanceId },

    #[error("Failed to load script '{url}': {reason}")]
    ScriptLoadFailed { url: String, reason: String },

    #[error("Invalid registration transition from {from} on {event}")]
    InvalidTransition {
        from: RegistrationPhase,
        event: RegistrationEvent,
    },

    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),

    #[error("Operation cancelled: {scope}")]
    Cancelled { scope: String },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl BridgeError {
    /// Wrap a rejected hub primitive
    pub fn substrate(operation: impl Into<String>, error: impl fmt::Display) -> Self {
        Self::SubstrateOperationFailed {
            operation: operation.into(),
            reason: error.to_string(),
        }
    }

    pub fn not_established(instance_id: &ComponentInstanceId) -> Self {
        Self::ChannelNotEstablished {
            instance_id: instance_id.clone(),
        }
    }

    pub fn cancelled(scope: impl Into<String>) -> Self {
        Self::Cancelled {
            scope: scope.into(),
        }
    }

    /// True for errors caused by the caller using an instance before its channel exists
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::ChannelNotEstablished { .. } | Self::InstanceAlreadyExists { .. }
        )
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
