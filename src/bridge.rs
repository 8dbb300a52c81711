//! # Portlet Bridge
//!
//! Public facade over hub registration and the event relay. Every operation
//! is keyed by [`ComponentInstanceId`]; instances are independent of each
//! other.
//!
//! Dropping the bridge disposes every instance left in its registry.

use crate::component::{Page, PortletElement, ScriptLoader};
use crate::config::{BridgeConfig, ConfigManager};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{BridgeEvent, EventPublisher, EventRelay, PublishedEvent};
use crate::logging;
use crate::models::{ComponentInstanceId, ListenerId, Parameters, PortletMode, WindowState};
use crate::orchestration::{Bootstrap, HubRegistrar};
use crate::polling::{IdleGatedExecutor, ReadinessGate};
use crate::registry::ChannelRegistry;
use crate::state_machine::RegistrationPhase;
use crate::substrate::PortletHub;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

pub struct PortletBridge {
    config: BridgeConfig,
    registry: Arc<ChannelRegistry>,
    publisher: EventPublisher,
    relay: EventRelay,
    registrar: HubRegistrar,
}

impl PortletBridge {
    pub fn new(config: BridgeConfig, hub: Arc<dyn PortletHub>, page: Arc<dyn Page>) -> Self {
        Self::with_registry(config, Arc::new(ChannelRegistry::new()), hub, page)
    }

    /// Build a bridge from `portlet-bridge.toml` layered with `PORTLET_BRIDGE_*` overrides
    pub fn from_environment(hub: Arc<dyn PortletHub>, page: Arc<dyn Page>) -> BridgeResult<Self> {
        let manager = ConfigManager::load()?;
        Ok(Self::new(manager.config().clone(), hub, page))
    }

    /// Build a bridge over an existing channel registry
    pub fn with_registry(
        config: BridgeConfig,
        registry: Arc<ChannelRegistry>,
        hub: Arc<dyn PortletHub>,
        page: Arc<dyn Page>,
    ) -> Self {
        logging::init_structured_logging();

        let publisher = EventPublisher::new(config.events.channel_capacity);
        let relay = EventRelay::new(
            Arc::clone(&registry),
            Arc::clone(&page),
            IdleGatedExecutor::from_config(&config.idle),
            publisher.clone(),
        );
        let registrar = HubRegistrar::new(
            Arc::clone(&registry),
            hub,
            page,
            relay.clone(),
            publisher.clone(),
            config.relay.state_change_event.clone(),
        );

        Self {
            config,
            registry,
            publisher,
            relay,
            registrar,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<PublishedEvent> {
        self.publisher.subscribe()
    }

    /// Bootstrap over `loader` using the configured readiness budget
    pub fn bootstrap(&self, loader: Arc<dyn ScriptLoader>) -> Bootstrap {
        Bootstrap::new(loader, ReadinessGate::from_config(&self.config.readiness))
    }

    pub fn register_hub(
        &self,
        tag: &str,
        instance_id: &ComponentInstanceId,
        element: Arc<dyn PortletElement>,
    ) -> BridgeResult<()> {
        self.registrar.register_hub(tag, instance_id, element)
    }

    pub async fn register_element(
        &self,
        tag: &str,
        instance_id: &ComponentInstanceId,
    ) -> BridgeResult<()> {
        self.registrar.register_element(tag, instance_id).await
    }

    pub async fn set_portlet_state(
        &self,
        instance_id: &ComponentInstanceId,
        window_state: WindowState,
        portlet_mode: PortletMode,
        reload_after_change: bool,
    ) -> BridgeResult<()> {
        self.relay
            .set_portlet_state(instance_id, window_state, portlet_mode, reload_after_change)
            .await
    }

    pub fn fire_event(
        &self,
        instance_id: &ComponentInstanceId,
        event_type: &str,
        parameters: &Parameters,
    ) -> BridgeResult<()> {
        self.relay.fire_event(instance_id, event_type, parameters)
    }

    pub fn register_listener(
        &self,
        instance_id: &ComponentInstanceId,
        event_type: &str,
        listener_id: ListenerId,
    ) -> BridgeResult<()> {
        self.relay
            .register_listener(instance_id, event_type, listener_id)
    }

    pub fn unregister_listener(
        &self,
        instance_id: &ComponentInstanceId,
        listener_id: &ListenerId,
    ) -> BridgeResult<()> {
        self.relay.unregister_listener(instance_id, listener_id)
    }

    /// Resolves once the instance's hub channel is established.
    ///
    /// Fails with `Cancelled` when the instance is disposed first.
    pub async fn wait_until_established(
        &self,
        instance_id: &ComponentInstanceId,
    ) -> BridgeResult<()> {
        let entry = self.registry.get_or_create(instance_id);
        let cancel = entry.cancellation_token().clone();
        let mut phases = entry.subscribe_phase();
        let scope = format!("channel establishment of {instance_id}");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BridgeError::cancelled(scope)),
            reached = phases.wait_for(|phase| *phase == RegistrationPhase::Established) => {
                reached.map(|_| ()).map_err(|_| BridgeError::cancelled(scope))
            }
        }
    }

    /// Tear down an instance: cancel its pending polls, release its hub
    /// subscriptions and forget its channel state.
    ///
    /// Returns false when the instance was unknown.
    pub fn dispose(&self, instance_id: &ComponentInstanceId) -> bool {
        let Some(entry) = self.registry.dispose(instance_id) else {
            debug!(instance_id = %instance_id, "Dispose of unknown instance ignored");
            return false;
        };

        let (handle, subscriptions, update_subscription) = {
            let mut state = entry.lock();
            state.pending_listeners.clear();
            let mut subscriptions: Vec<_> =
                state.active_handles.drain().map(|(_, sub)| sub).collect();
            subscriptions.extend(state.state_change_subscription.take());
            (
                state.handle.clone(),
                subscriptions,
                state.update_subscription.take(),
            )
        };

        if let Some(handle) = handle {
            for subscription in subscriptions {
                if let Err(error) = handle.remove_event_listener(subscription) {
                    debug!(instance_id = %instance_id, error = %error, "Hub subscription already gone");
                }
            }
        }
        if let Some(subscription) = update_subscription {
            subscription
                .element
                .unsubscribe_after_update(subscription.observer_id);
        }

        logging::log_channel_operation("dispose", instance_id.as_str(), "released", None);
        self.publisher.publish(BridgeEvent::InstanceDisposed {
            instance_id: instance_id.clone(),
        });
        true
    }
}

impl Drop for PortletBridge {
    fn drop(&mut self) {
        let remaining = self.registry.ids();
        if remaining.is_empty() {
            return;
        }
        debug!(instances = remaining.len(), "Bridge dropped, disposing remaining instances");
        for instance_id in &remaining {
            self.dispose(instance_id);
        }
    }
}
