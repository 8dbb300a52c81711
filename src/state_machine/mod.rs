//! # Registration State Machine
//!
//! Phases a component instance moves through while its hub channel is
//! established:
//!
//! ```text
//! Unbound ──bind──► AwaitingFirstUpdate ──first_update──► Establishing ──channel_resolved──► Established
//!                          ▲                                   │
//!                          └───────────channel_failed──────────┘
//! ```
//!
//! A failed registration falls back to `AwaitingFirstUpdate`, so the next
//! component update may request a channel again. Nothing retries on its own.

pub mod events;
pub mod states;

pub use events::RegistrationEvent;
pub use states::RegistrationPhase;

use crate::error::{BridgeError, BridgeResult};

/// Compute the phase reached by applying `event` in phase `from`
pub fn transition(
    from: RegistrationPhase,
    event: RegistrationEvent,
) -> BridgeResult<RegistrationPhase> {
    use RegistrationEvent as E;
    use RegistrationPhase as P;

    match (from, event) {
        (P::Unbound, E::Bind) => Ok(P::AwaitingFirstUpdate),
        (P::AwaitingFirstUpdate, E::FirstUpdate) => Ok(P::Establishing),
        (P::Establishing, E::ChannelResolved) => Ok(P::Established),
        (P::Establishing, E::ChannelFailed) => Ok(P::AwaitingFirstUpdate),
        (from, event) => Err(BridgeError::InvalidTransition { from, event }),
    }
}
