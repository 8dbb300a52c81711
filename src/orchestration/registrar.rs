//! # Hub Registrar
//!
//! Binds a component instance to the portlet hub.
//!
//! Registration is deferred until the component has applied its first
//! server update: `register_hub` only attaches an [`UpdateObserver`] to the
//! target element. The first notification moves the instance to
//! `Establishing` and spawns the establishment task; notifications arriving
//! while a request is outstanding or after establishment are ignored, so the
//! hub sees exactly one `register` per instance.
//!
//! Establishment stores the handle, subscribes the placeholder state-change
//! listener and drains every buffered listener in one critical section.
//! Listener registrations racing with it therefore land either in the
//! pending buffer before the drain or on the live handle after it.

use crate::component::{Page, PortletElement, UpdateObserver};
use crate::error::{BridgeError, BridgeResult};
use crate::events::{BridgeEvent, EventPublisher, EventRelay};
use crate::logging;
use crate::models::{ComponentInstanceId, Parameters};
use crate::registry::channel_registry::UpdateSubscription;
use crate::registry::{ChannelEntry, ChannelRegistry, ElementBinding};
use crate::state_machine::{RegistrationEvent, RegistrationPhase};
use crate::substrate::{EventCallback, PortletHub};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct HubRegistrar {
    registry: Arc<ChannelRegistry>,
    hub: Arc<dyn PortletHub>,
    page: Arc<dyn Page>,
    relay: EventRelay,
    publisher: EventPublisher,
    state_change_event: String,
}

impl HubRegistrar {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        hub: Arc<dyn PortletHub>,
        page: Arc<dyn Page>,
        relay: EventRelay,
        publisher: EventPublisher,
        state_change_event: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            hub,
            page,
            relay,
            publisher,
            state_change_event: state_change_event.into(),
        }
    }

    /// Bind `instance_id` to the `tag` element carrying its portlet id.
    ///
    /// `element` provides the client registry used by the inbound poller. A
    /// second call for an instance that is already bound is a no-op.
    pub fn register_hub(
        &self,
        tag: &str,
        instance_id: &ComponentInstanceId,
        element: Arc<dyn PortletElement>,
    ) -> BridgeResult<()> {
        let runtime =
            Handle::try_current().map_err(|e| BridgeError::RuntimeUnavailable(e.to_string()))?;
        let target = self
            .page
            .query_elements(tag)
            .into_iter()
            .find(|candidate| candidate.portlet_id().as_ref() == Some(instance_id))
            .ok_or_else(|| BridgeError::ElementNotFound {
                tag: tag.to_string(),
                instance_id: instance_id.clone(),
            })?;

        let entry = self.registry.get_or_create(instance_id);
        let app_id = target.app_id();
        {
            let mut state = entry.lock();
            if state.phase() != RegistrationPhase::Unbound {
                debug!(instance_id = %instance_id, phase = %state.phase(), "Hub already bound, ignoring");
                return Ok(());
            }
            state.binding = Some(ElementBinding {
                element,
                app_id: app_id.clone(),
            });
            entry.apply(&mut state, RegistrationEvent::Bind)?;
        }

        let observer = Arc::new(FirstUpdateObserver {
            registrar: self.clone(),
            entry: Arc::downgrade(&entry),
            runtime,
        });
        let observer_id = target.subscribe_after_update(observer);

        // The first update may already have established the channel.
        let still_waiting = {
            let mut state = entry.lock();
            let waiting =
                state.phase() != RegistrationPhase::Established && !entry.is_disposed();
            if waiting {
                state.update_subscription = Some(UpdateSubscription {
                    element: Arc::clone(&target),
                    observer_id,
                });
            }
            waiting
        };
        if !still_waiting {
            target.unsubscribe_after_update(observer_id);
        }

        logging::log_channel_operation("bind", instance_id.as_str(), "awaiting_first_update", app_id.as_deref());
        self.publisher.publish(BridgeEvent::HubBound {
            instance_id: instance_id.clone(),
            app_id,
        });
        Ok(())
    }

    /// Wait for the `tag` custom element to be defined, then bind `instance_id`
    /// using the first such element as the client-registry element.
    pub async fn register_element(
        &self,
        tag: &str,
        instance_id: &ComponentInstanceId,
    ) -> BridgeResult<()> {
        self.page
            .when_defined(tag)
            .await
            .map_err(|e| BridgeError::DependencyNotReady {
                dependency: format!("<{tag}>"),
                reason: e.to_string(),
            })?;

        let element = self
            .page
            .query_elements(tag)
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::ElementNotFound {
                tag: tag.to_string(),
                instance_id: instance_id.clone(),
            })?;

        self.register_hub(tag, instance_id, element)
    }

    /// Request the hub channel for an entry in `Establishing`.
    ///
    /// Returns the number of buffered listeners activated on success. On
    /// failure the entry falls back to `AwaitingFirstUpdate`.
    pub(crate) async fn establish(&self, entry: Arc<ChannelEntry>) -> BridgeResult<usize> {
        let instance_id = entry.instance_id().clone();
        let cancel = entry.cancellation_token().clone();

        let registered = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(BridgeError::cancelled(format!("hub registration of {instance_id}"))),
            result = self.hub.register(&instance_id) => {
                result.map_err(|e| BridgeError::substrate("register", e))
            }
        };

        let handle = match registered {
            Ok(handle) => handle,
            Err(error) => {
                self.fail_establishment(&entry, &error);
                return Err(error);
            }
        };

        let (drained, update_subscription) = {
            let mut state = entry.lock();
            if entry.is_disposed() {
                return Err(BridgeError::cancelled(format!(
                    "hub registration of {instance_id}"
                )));
            }

            entry.apply(&mut state, RegistrationEvent::ChannelResolved)?;
            state.handle = Some(Arc::clone(&handle));

            let placeholder: EventCallback = Arc::new(|_: &str, _: Option<&Parameters>| {});
            match handle.add_event_listener(&self.state_change_event, placeholder) {
                Ok(subscription) => state.state_change_subscription = Some(subscription),
                Err(error) => warn!(
                    instance_id = %instance_id,
                    event_type = %self.state_change_event,
                    error = %error,
                    "Failed to subscribe state change placeholder"
                ),
            }

            let drained = self.relay.drain_pending(&entry, &mut state, &handle);
            (drained, state.update_subscription.take())
        };

        if let Some(subscription) = update_subscription {
            subscription
                .element
                .unsubscribe_after_update(subscription.observer_id);
        }

        info!(instance_id = %instance_id, drained_listeners = drained, "🔗 Hub channel established");
        self.publisher.publish(BridgeEvent::ChannelEstablished {
            instance_id,
            drained_listeners: drained,
        });
        Ok(drained)
    }

    fn fail_establishment(&self, entry: &ChannelEntry, error: &BridgeError) {
        {
            let mut state = entry.lock();
            if state.phase() == RegistrationPhase::Establishing {
                if let Err(transition_error) =
                    entry.apply(&mut state, RegistrationEvent::ChannelFailed)
                {
                    warn!(error = %transition_error, "Could not roll back registration phase");
                }
            }
        }

        if error.is_cancelled() {
            debug!(instance_id = %entry.instance_id(), "Hub registration abandoned");
            return;
        }

        logging::log_error(
            "hub_registrar",
            "establish",
            &error.to_string(),
            Some(entry.instance_id().as_str()),
        );
        self.publisher.publish(BridgeEvent::EstablishmentFailed {
            instance_id: entry.instance_id().clone(),
            reason: error.to_string(),
        });
    }
}

/// Requests the hub channel on the first component update after binding
struct FirstUpdateObserver {
    registrar: HubRegistrar,
    entry: Weak<ChannelEntry>,
    runtime: Handle,
}

impl UpdateObserver for FirstUpdateObserver {
    fn after_server_update(&self) {
        let Some(entry) = self.entry.upgrade() else {
            return;
        };
        if entry.is_disposed() {
            return;
        }

        {
            let mut state = entry.lock();
            if state.phase() != RegistrationPhase::AwaitingFirstUpdate {
                return;
            }
            if entry.apply(&mut state, RegistrationEvent::FirstUpdate).is_err() {
                return;
            }
        }

        debug!(instance_id = %entry.instance_id(), "First component update, requesting hub channel");
        let registrar = self.registrar.clone();
        self.runtime.spawn(async move {
            // failures are logged and published by establish
            let _ = registrar.establish(entry).await;
        });
    }
}
