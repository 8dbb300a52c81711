#![allow(clippy::doc_markdown)] // Allow technical terms like PortletHub, UIDL in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Portlet Hub Bridge
//!
//! Hub registration and event relay between a server-rendered UI component
//! embedded in a portal page and that page's inter-portlet communication hub.
//!
//! ## Overview
//!
//! The embedded component and the portal's portlet hub are loaded independently
//! and in no particular order. This crate establishes one hub channel per
//! embedded component instance once both sides are available, and then uses
//! that channel to push render-state changes, dispatch client events and relay
//! hub events back into the component.
//!
//! ## Architecture
//!
//! ```text
//! Bootstrap ──► ReadinessGate ──► HubRegistrar ──► ChannelRegistry
//!                                     │                  ▲
//!                                     ▼                  │
//!                               EventRelay ──► IdleGatedExecutor ──► HubHandle
//! ```
//!
//! - **Readiness gate**: bounded, scheduled polling of a dependency marker
//! - **Channel registry**: per-instance channel state with an explicit lifecycle
//! - **Idle-gated executor**: at most one locally issued hub mutation in flight
//! - **Hub registrar**: establishes the channel on the component's first update
//!   and drains listeners buffered before the channel existed
//! - **Event relay**: outbound dispatch, render-state mutation and the inbound
//!   event poller
//!
//! ## Module Organization
//!
//! - [`bridge`] - Public facade keyed by component instance id
//! - [`component`] - Seams to the embedded UI component and its page
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`events`] - Event relay and lifecycle event publishing
//! - [`models`] - Identifiers, parameters and render state
//! - [`orchestration`] - Hub registration and script bootstrap
//! - [`polling`] - Readiness gate and idle-gated executor
//! - [`registry`] - Channel registry
//! - [`state_machine`] - Registration phases and transitions
//! - [`substrate`] - Seams to the portal's portlet hub
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portlet_hub_bridge::{BridgeConfig, ComponentInstanceId, ListenerId, PortletBridge};
//! use portlet_hub_bridge::component::{Page, PortletElement};
//! use portlet_hub_bridge::substrate::PortletHub;
//! use std::sync::Arc;
//!
//! # async fn example(
//! #     hub: Arc<dyn PortletHub>,
//! #     page: Arc<dyn Page>,
//! #     element: Arc<dyn PortletElement>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let bridge = PortletBridge::new(BridgeConfig::default(), hub, page);
//! let id = ComponentInstanceId::new("portlet_A");
//!
//! // Listeners may be registered before the hub channel exists
//! bridge.register_listener(&id, "cart.updated", ListenerId::new("1"))?;
//!
//! bridge.register_hub("my-portlet", &id, element)?;
//! bridge.wait_until_established(&id).await?;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod component;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod polling;
pub mod registry;
pub mod state_machine;
pub mod substrate;

pub use bridge::PortletBridge;
pub use config::{
    BridgeConfig, ConfigManager, EventsConfig, IdleConfig, ReadinessConfig, RelayConfig,
};
pub use error::{BridgeError, BridgeResult};
pub use events::{BridgeEvent, EventPublisher, EventRelay, InboundContext, PublishedEvent};
pub use models::{
    merge_parameters, ComponentInstanceId, ListenerId, Parameters, PortletMode, RenderState,
    WindowState,
};
pub use orchestration::{Bootstrap, HubRegistrar};
pub use polling::{IdleGatedExecutor, ReadinessGate};
pub use registry::{ChannelEntry, ChannelRegistry, ChannelState};
pub use state_machine::{RegistrationEvent, RegistrationPhase};
