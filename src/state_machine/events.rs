use serde::{Deserialize, Serialize};
use std::fmt;

/// Events that drive a component instance through its registration phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationEvent {
    /// Update observer attached to the portlet element
    Bind,
    /// Component reported a server update while no channel was requested
    FirstUpdate,
    /// Hub registration resolved with a handle
    ChannelResolved,
    /// Hub registration rejected
    ChannelFailed,
}

impl RegistrationEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::FirstUpdate => "first_update",
            Self::ChannelResolved => "channel_resolved",
            Self::ChannelFailed => "channel_failed",
        }
    }
}

impl fmt::Display for RegistrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}
