//! # Registry
//!
//! Instance-keyed channel state shared by the orchestrator, the event relay and
//! the bridge facade.

pub mod channel_registry;

pub use channel_registry::{ChannelEntry, ChannelRegistry, ChannelState, ElementBinding};
