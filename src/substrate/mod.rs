//! # Portlet Hub Seam
//!
//! Capability-style view of the portal's inter-portlet communication hub. A
//! [`PortletHub`] hands out one [`HubHandle`] per registered portlet; all
//! render-state mutation, client event dispatch, actions and event
//! subscriptions go through that handle.
//!
//! The hub's own consistency rules apply to the handle: only one
//! state-changing operation may be outstanding at a time, which is why every
//! mutation issued by the bridge is routed through
//! [`IdleGatedExecutor`](crate::polling::IdleGatedExecutor).

use crate::models::{ComponentInstanceId, Parameters, RenderState};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Callback invoked by the hub with `(event_type, payload)` for a subscribed event
pub type EventCallback = Arc<dyn Fn(&str, Option<&Parameters>) + Send + Sync>;

/// Errors reported by the hub's primitives
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubstrateError {
    #[error("hub rejected the request: {0}")]
    Rejected(String),
    #[error("hub unavailable: {0}")]
    Unavailable(String),
}

/// Opaque subscription token returned by `add_event_listener`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(String);

impl SubscriptionHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

/// Entry point of the portal's hub: registers a portlet and yields its handle
#[async_trait]
pub trait PortletHub: Send + Sync {
    async fn register(
        &self,
        instance_id: &ComponentInstanceId,
    ) -> Result<Arc<dyn HubHandle>, SubstrateError>;
}

/// Per-portlet hub capability
#[async_trait]
pub trait HubHandle: Send + Sync {
    /// Whether a previously issued operation is still outstanding.
    ///
    /// `Ok(None)` means the hub could not say; callers treat that, an error
    /// and a panic all as "still in progress".
    fn is_in_progress(&self) -> Result<Option<bool>, SubstrateError>;

    fn new_state(&self) -> RenderState;

    fn set_render_state(&self, state: RenderState) -> Result<(), SubstrateError>;

    fn new_parameters(&self) -> Parameters;

    fn dispatch_client_event(
        &self,
        event_type: &str,
        parameters: Parameters,
    ) -> Result<(), SubstrateError>;

    /// Submit an action request to the portal; resolves once the action completed
    async fn action(&self, parameters: Parameters) -> Result<(), SubstrateError>;

    fn add_event_listener(
        &self,
        event_type: &str,
        callback: EventCallback,
    ) -> Result<SubscriptionHandle, SubstrateError>;

    fn remove_event_listener(&self, handle: SubscriptionHandle) -> Result<(), SubstrateError>;
}
