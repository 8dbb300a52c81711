//! Lifecycle events published by the bridge.

use crate::models::{ComponentInstanceId, ListenerId};
use serde::{Deserialize, Serialize};

/// Event names used for `BridgeEvent::name`
pub mod names {
    pub const HUB_BOUND: &str = "hub.bound";
    pub const CHANNEL_ESTABLISHED: &str = "channel.established";
    pub const ESTABLISHMENT_FAILED: &str = "channel.establishment_failed";
    pub const LISTENER_BUFFERED: &str = "listener.buffered";
    pub const LISTENER_ACTIVATED: &str = "listener.activated";
    pub const LISTENER_ACTIVATION_FAILED: &str = "listener.activation_failed";
    pub const LISTENER_REMOVED: &str = "listener.removed";
    pub const EVENT_DISPATCHED: &str = "event.dispatched";
    pub const RENDER_STATE_SUBMITTED: &str = "render_state.submitted";
    pub const PAGE_RELOADED: &str = "page.reloaded";
    pub const INBOUND_EVENT_RELAYED: &str = "event.inbound_relayed";
    pub const INSTANCE_DISPOSED: &str = "instance.disposed";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// An update observer was attached to the instance's element
    HubBound {
        instance_id: ComponentInstanceId,
        app_id: Option<String>,
    },
    ChannelEstablished {
        instance_id: ComponentInstanceId,
        drained_listeners: usize,
    },
    EstablishmentFailed {
        instance_id: ComponentInstanceId,
        reason: String,
    },
    ListenerBuffered {
        instance_id: ComponentInstanceId,
        listener_id: ListenerId,
        event_type: String,
    },
    ListenerActivated {
        instance_id: ComponentInstanceId,
        listener_id: ListenerId,
        event_type: String,
    },
    /// A buffered listener could not be subscribed when the channel opened;
    /// it stays buffered
    ListenerActivationFailed {
        instance_id: ComponentInstanceId,
        listener_id: ListenerId,
        event_type: String,
        reason: String,
    },
    ListenerRemoved {
        instance_id: ComponentInstanceId,
        listener_id: ListenerId,
        was_active: bool,
    },
    EventDispatched {
        instance_id: ComponentInstanceId,
        event_type: String,
    },
    /// `reload` is true when a page reload was scheduled behind the change
    RenderStateSubmitted {
        instance_id: ComponentInstanceId,
        reload: bool,
    },
    PageReloaded {
        instance_id: ComponentInstanceId,
    },
    InboundEventRelayed {
        instance_id: ComponentInstanceId,
        listener_id: ListenerId,
        event_type: String,
    },
    InstanceDisposed {
        instance_id: ComponentInstanceId,
    },
}

impl BridgeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HubBound { .. } => names::HUB_BOUND,
            Self::ChannelEstablished { .. } => names::CHANNEL_ESTABLISHED,
            Self::EstablishmentFailed { .. } => names::ESTABLISHMENT_FAILED,
            Self::ListenerBuffered { .. } => names::LISTENER_BUFFERED,
            Self::ListenerActivated { .. } => names::LISTENER_ACTIVATED,
            Self::ListenerActivationFailed { .. } => names::LISTENER_ACTIVATION_FAILED,
            Self::ListenerRemoved { .. } => names::LISTENER_REMOVED,
            Self::EventDispatched { .. } => names::EVENT_DISPATCHED,
            Self::RenderStateSubmitted { .. } => names::RENDER_STATE_SUBMITTED,
            Self::PageReloaded { .. } => names::PAGE_RELOADED,
            Self::InboundEventRelayed { .. } => names::INBOUND_EVENT_RELAYED,
            Self::InstanceDisposed { .. } => names::INSTANCE_DISPOSED,
        }
    }

    pub fn instance_id(&self) -> &ComponentInstanceId {
        match self {
            Self::HubBound { instance_id, .. }
            | Self::ChannelEstablished { instance_id, .. }
            | Self::EstablishmentFailed { instance_id, .. }
            | Self::ListenerBuffered { instance_id, .. }
            | Self::ListenerActivated { instance_id, .. }
            | Self::ListenerActivationFailed { instance_id, .. }
            | Self::ListenerRemoved { instance_id, .. }
            | Self::EventDispatched { instance_id, .. }
            | Self::RenderStateSubmitted { instance_id, .. }
            | Self::PageReloaded { instance_id }
            | Self::InboundEventRelayed { instance_id, .. }
            | Self::InstanceDisposed { instance_id } => instance_id,
        }
    }
}
