use serde::{Deserialize, Serialize};
use std::fmt;

/// Hub registration phase of one component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPhase {
    /// No update observer attached yet
    #[default]
    Unbound,
    /// Observer attached, waiting for the component's first server update
    AwaitingFirstUpdate,
    /// Hub registration requested, not yet resolved
    Establishing,
    /// Hub handle stored; steady state for the rest of the instance's life
    Established,
}

impl RegistrationPhase {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Established)
    }

    /// A hub registration has been issued for this instance (in flight or resolved)
    pub fn has_channel_request(&self) -> bool {
        matches!(self, Self::Establishing | Self::Established)
    }
}

impl fmt::Display for RegistrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbound => write!(f, "unbound"),
            Self::AwaitingFirstUpdate => write!(f, "awaiting_first_update"),
            Self::Establishing => write!(f, "establishing"),
            Self::Established => write!(f, "established"),
        }
    }
}

impl std::str::FromStr for RegistrationPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unbound" => Ok(Self::Unbound),
            "awaiting_first_update" => Ok(Self::AwaitingFirstUpdate),
            "establishing" => Ok(Self::Establishing),
            "established" => Ok(Self::Established),
            _ => Err(format!("Invalid registration phase: {s}")),
        }
    }
}
