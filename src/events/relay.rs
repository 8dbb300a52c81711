//! # Event Relay
//!
//! Outbound event dispatch, render-state mutation, listener bookkeeping and
//! the inbound event poller for established hub channels.
//!
//! ## Listener lifecycle
//!
//! ```text
//! register_listener ──no channel──► pending_listeners ──establishment drain──┐
//!         │                                                                  ▼
//!         └────────channel established──────────────────────────────► active_handles
//! ```
//!
//! A listener id moves from pending to active at most once. Re-registering an
//! id replaces the earlier registration; an active subscription is removed
//! from the hub before its replacement is added. A buffered listener whose hub
//! subscription is refused during the drain stays pending until it is
//! registered again or unregistered.
//!
//! ## Inbound path
//!
//! The hub invokes listener callbacks synchronously. Each callback spawns
//! [`EventRelay::poll_event`] on the runtime captured when the listener was
//! activated. Callbacks hold the registry weakly, so a dropped bridge is not
//! kept alive by the hub. The poller waits for the hub to go idle, submits an action
//! carrying the event envelope and then forces a client poll so the rendered
//! component catches up with server-side state.

use super::publisher::EventPublisher;
use super::types::BridgeEvent;
use crate::component::Page;
use crate::constants::params;
use crate::error::{BridgeError, BridgeResult};
use crate::logging;
use crate::models::{
    merge_parameters, single_value, ComponentInstanceId, ListenerId, Parameters, PortletMode,
    WindowState,
};
use crate::polling::IdleGatedExecutor;
use crate::registry::{ChannelEntry, ChannelRegistry, ChannelState};
use crate::substrate::{EventCallback, HubHandle, SubscriptionHandle};
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Placeholder when the bound element carries no application id
const UNSET_APP_ID: &str = "<unset>";

/// An event delivered by the hub to one of our listeners
#[derive(Debug, Clone, PartialEq)]
pub struct InboundContext {
    pub instance_id: ComponentInstanceId,
    pub listener_id: ListenerId,
    pub event_type: String,
    pub payload: Option<Parameters>,
}

#[derive(Clone)]
pub struct EventRelay {
    registry: Arc<ChannelRegistry>,
    page: Arc<dyn Page>,
    idle: IdleGatedExecutor,
    publisher: EventPublisher,
}

/// Relay captured by hub callbacks, upgraded per delivered event
#[derive(Clone)]
struct WeakRelay {
    registry: Weak<ChannelRegistry>,
    page: Arc<dyn Page>,
    idle: IdleGatedExecutor,
    publisher: EventPublisher,
}

impl WeakRelay {
    fn upgrade(&self) -> Option<EventRelay> {
        let registry = self.registry.upgrade()?;
        Some(EventRelay {
            registry,
            page: Arc::clone(&self.page),
            idle: self.idle.clone(),
            publisher: self.publisher.clone(),
        })
    }
}

impl EventRelay {
    pub fn new(
        registry: Arc<ChannelRegistry>,
        page: Arc<dyn Page>,
        idle: IdleGatedExecutor,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            registry,
            page,
            idle,
            publisher,
        }
    }

    fn downgrade(&self) -> WeakRelay {
        WeakRelay {
            registry: Arc::downgrade(&self.registry),
            page: Arc::clone(&self.page),
            idle: self.idle.clone(),
            publisher: self.publisher.clone(),
        }
    }

    fn established(
        &self,
        instance_id: &ComponentInstanceId,
    ) -> BridgeResult<(Arc<ChannelEntry>, Arc<dyn HubHandle>)> {
        let entry = self
            .registry
            .get(instance_id)
            .ok_or_else(|| BridgeError::not_established(instance_id))?;
        let handle = entry.require_handle()?;
        Ok((entry, handle))
    }

    /// Dispatch a client event through the instance's hub handle.
    ///
    /// Caller parameters are laid over the hub's fresh parameter set; caller
    /// keys win. Dispatch is not idle-gated.
    pub fn fire_event(
        &self,
        instance_id: &ComponentInstanceId,
        event_type: &str,
        parameters: &Parameters,
    ) -> BridgeResult<()> {
        let (_, handle) = self.established(instance_id)?;

        let merged = merge_parameters(handle.new_parameters(), parameters);
        handle
            .dispatch_client_event(event_type, merged)
            .map_err(|e| BridgeError::substrate("dispatchClientEvent", e))?;

        debug!(instance_id = %instance_id, event_type = %event_type, "📤 Client event dispatched");
        self.publisher.publish(BridgeEvent::EventDispatched {
            instance_id: instance_id.clone(),
            event_type: event_type.to_string(),
        });
        Ok(())
    }

    /// Submit a new window state and portlet mode once the hub is idle.
    ///
    /// With `reload_after_change` a page reload is scheduled behind a second
    /// idle wait. The reload runs in the background and is cancelled only by
    /// disposing the instance; completion is published as `PageReloaded`.
    pub async fn set_portlet_state(
        &self,
        instance_id: &ComponentInstanceId,
        window_state: WindowState,
        portlet_mode: PortletMode,
        reload_after_change: bool,
    ) -> BridgeResult<()> {
        let (entry, handle) = self.established(instance_id)?;
        let cancel = entry.cancellation_token().clone();
        let scope = instance_id.to_string();

        self.idle
            .run_when_idle(&scope, &handle, &cancel, move |hub| {
                let mut state = hub.new_state();
                state.window_state = Some(window_state);
                state.portlet_mode = Some(portlet_mode);
                hub.set_render_state(state)
            })
            .await?
            .map_err(|e| BridgeError::substrate("setRenderState", e))?;

        self.publisher.publish(BridgeEvent::RenderStateSubmitted {
            instance_id: instance_id.clone(),
            reload: reload_after_change,
        });

        if reload_after_change {
            self.schedule_reload(instance_id.clone(), handle, cancel);
        }
        Ok(())
    }

    fn schedule_reload(
        &self,
        instance_id: ComponentInstanceId,
        handle: Arc<dyn HubHandle>,
        cancel: CancellationToken,
    ) {
        let page = Arc::clone(&self.page);
        let idle = self.idle.clone();
        let publisher = self.publisher.clone();

        tokio::spawn(async move {
            let reloaded = idle
                .run_when_idle(instance_id.as_str(), &handle, &cancel, move |_| page.reload())
                .await;
            match reloaded {
                Ok(()) => {
                    info!(instance_id = %instance_id, "🔄 Page reloaded after render state change");
                    publisher.publish(BridgeEvent::PageReloaded { instance_id });
                }
                Err(error) if error.is_cancelled() => {
                    debug!(instance_id = %instance_id, "Scheduled reload abandoned");
                }
                Err(error) => logging::log_error(
                    "event_relay",
                    "reload",
                    &error.to_string(),
                    Some(instance_id.as_str()),
                ),
            }
        });
    }

    /// Subscribe `listener_id` to `event_type`, or buffer it until the channel exists
    pub fn register_listener(
        &self,
        instance_id: &ComponentInstanceId,
        event_type: &str,
        listener_id: ListenerId,
    ) -> BridgeResult<()> {
        let entry = self.registry.get_or_create(instance_id);
        let mut state = entry.lock();

        let Some(handle) = state.handle.clone() else {
            if let Some(previous) = state
                .pending_listeners
                .insert(listener_id.clone(), event_type.to_string())
            {
                debug!(
                    instance_id = %instance_id,
                    listener_id = %listener_id,
                    previous_event_type = %previous,
                    "Buffered listener replaced"
                );
            }
            drop(state);

            logging::log_listener_operation(
                "register",
                instance_id.as_str(),
                listener_id.as_str(),
                Some(event_type),
                "buffered",
            );
            self.publisher.publish(BridgeEvent::ListenerBuffered {
                instance_id: instance_id.clone(),
                listener_id,
                event_type: event_type.to_string(),
            });
            return Ok(());
        };

        if let Some(superseded) = state.active_handles.remove(&listener_id) {
            if let Err(error) = handle.remove_event_listener(superseded) {
                warn!(
                    instance_id = %instance_id,
                    listener_id = %listener_id,
                    error = %error,
                    "Failed to remove superseded hub subscription"
                );
            }
        }

        let subscription = self.activate_listener(instance_id, &handle, &listener_id, event_type)?;
        state.pending_listeners.remove(&listener_id);
        state.active_handles.insert(listener_id.clone(), subscription);
        drop(state);

        logging::log_listener_operation(
            "register",
            instance_id.as_str(),
            listener_id.as_str(),
            Some(event_type),
            "active",
        );
        self.publisher.publish(BridgeEvent::ListenerActivated {
            instance_id: instance_id.clone(),
            listener_id,
            event_type: event_type.to_string(),
        });
        Ok(())
    }

    /// Remove a listener. Unknown instances and ids are ignored.
    pub fn unregister_listener(
        &self,
        instance_id: &ComponentInstanceId,
        listener_id: &ListenerId,
    ) -> BridgeResult<()> {
        let Some(entry) = self.registry.get(instance_id) else {
            return Ok(());
        };
        let mut state = entry.lock();

        let was_active = match state.handle.clone() {
            Some(handle) => {
                let Some(subscription) = state.active_handles.remove(listener_id) else {
                    // left over from a refused drain
                    if state.pending_listeners.remove(listener_id).is_none() {
                        return Ok(());
                    }
                    drop(state);
                    self.publisher.publish(BridgeEvent::ListenerRemoved {
                        instance_id: instance_id.clone(),
                        listener_id: listener_id.clone(),
                        was_active: false,
                    });
                    return Ok(());
                };
                handle
                    .remove_event_listener(subscription)
                    .map_err(|e| BridgeError::substrate("removeEventListener", e))?;
                true
            }
            None => {
                if state.pending_listeners.remove(listener_id).is_none() {
                    return Ok(());
                }
                false
            }
        };
        drop(state);

        logging::log_listener_operation(
            "unregister",
            instance_id.as_str(),
            listener_id.as_str(),
            None,
            if was_active { "removed" } else { "unbuffered" },
        );
        self.publisher.publish(BridgeEvent::ListenerRemoved {
            instance_id: instance_id.clone(),
            listener_id: listener_id.clone(),
            was_active,
        });
        Ok(())
    }

    /// Relay one inbound hub event back to the server and resynchronize the client
    pub async fn poll_event(&self, context: InboundContext) -> BridgeResult<()> {
        let (entry, handle) = self.established(&context.instance_id)?;
        let cancel = entry.cancellation_token().clone();
        let binding = entry.lock().binding.clone();
        let window_name = self.page.window_name();

        let envelope = self
            .idle
            .run_when_idle(context.instance_id.as_str(), &handle, &cancel, |hub| {
                let mut envelope = hub.new_parameters();
                envelope.insert(
                    params::EVENT_TYPE.to_string(),
                    single_value(context.event_type.as_str()),
                );
                envelope.insert(
                    params::LISTENER_UID.to_string(),
                    single_value(context.listener_id.as_str()),
                );
                envelope.insert(params::WINDOW_NAME.to_string(), single_value(window_name));
                match &context.payload {
                    Some(payload) => merge_parameters(envelope, payload),
                    None => envelope,
                }
            })
            .await?;

        handle
            .action(envelope)
            .await
            .map_err(|e| BridgeError::substrate("action", e))?;

        let app_id = binding.as_ref().and_then(|b| b.app_id.clone());
        let client = binding
            .as_ref()
            .zip(app_id.as_deref())
            .and_then(|(binding, app_id)| binding.element.client(app_id))
            .ok_or_else(|| BridgeError::ClientNotFound {
                app_id: app_id.clone().unwrap_or_else(|| UNSET_APP_ID.to_string()),
            })?;
        client
            .poll()
            .await
            .map_err(|e| BridgeError::substrate("poll", e))?;

        debug!(
            instance_id = %context.instance_id,
            listener_id = %context.listener_id,
            event_type = %context.event_type,
            "📥 Inbound event relayed"
        );
        self.publisher.publish(BridgeEvent::InboundEventRelayed {
            instance_id: context.instance_id,
            listener_id: context.listener_id,
            event_type: context.event_type,
        });
        Ok(())
    }

    /// Subscribe one listener on the hub, wiring its callback to the inbound poller
    pub(crate) fn activate_listener(
        &self,
        instance_id: &ComponentInstanceId,
        handle: &Arc<dyn HubHandle>,
        listener_id: &ListenerId,
        event_type: &str,
    ) -> BridgeResult<SubscriptionHandle> {
        let runtime =
            Handle::try_current().map_err(|e| BridgeError::RuntimeUnavailable(e.to_string()))?;
        let relay = self.downgrade();
        let instance_id = instance_id.clone();
        let listener_id = listener_id.clone();

        let callback: EventCallback = Arc::new(move |event_type: &str, payload: Option<&Parameters>| {
            let context = InboundContext {
                instance_id: instance_id.clone(),
                listener_id: listener_id.clone(),
                event_type: event_type.to_string(),
                payload: payload.cloned(),
            };
            let Some(relay) = relay.upgrade() else {
                debug!(instance_id = %context.instance_id, "Bridge dropped, inbound event ignored");
                return;
            };
            runtime.spawn(async move {
                let instance_id = context.instance_id.clone();
                if let Err(error) = relay.poll_event(context).await {
                    logging::log_error(
                        "event_relay",
                        "poll_event",
                        &error.to_string(),
                        Some(instance_id.as_str()),
                    );
                }
            });
        });

        handle
            .add_event_listener(event_type, callback)
            .map_err(|e| BridgeError::substrate("addEventListener", e))
    }

    /// Activate every buffered listener against a freshly resolved handle.
    ///
    /// Runs inside the establishment critical section. A listener whose
    /// subscription is refused stays pending and is reported with
    /// `ListenerActivationFailed`. Returns how many were activated.
    pub(crate) fn drain_pending(
        &self,
        entry: &ChannelEntry,
        state: &mut ChannelState,
        handle: &Arc<dyn HubHandle>,
    ) -> usize {
        let instance_id = entry.instance_id();
        let pending = std::mem::take(&mut state.pending_listeners);
        let mut activated = 0;

        for (listener_id, event_type) in pending {
            match self.activate_listener(instance_id, handle, &listener_id, &event_type) {
                Ok(subscription) => {
                    state.active_handles.insert(listener_id.clone(), subscription);
                    activated += 1;
                    logging::log_listener_operation(
                        "drain",
                        instance_id.as_str(),
                        listener_id.as_str(),
                        Some(&event_type),
                        "active",
                    );
                    self.publisher.publish(BridgeEvent::ListenerActivated {
                        instance_id: instance_id.clone(),
                        listener_id,
                        event_type,
                    });
                }
                Err(error) => {
                    logging::log_error(
                        "event_relay",
                        "drain_pending",
                        &error.to_string(),
                        Some(listener_id.as_str()),
                    );
                    self.publisher.publish(BridgeEvent::ListenerActivationFailed {
                        instance_id: instance_id.clone(),
                        listener_id: listener_id.clone(),
                        event_type: event_type.clone(),
                        reason: error.to_string(),
                    });
                    state.pending_listeners.insert(listener_id, event_type);
                }
            }
        }

        activated
    }
}
