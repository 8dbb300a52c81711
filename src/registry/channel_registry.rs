//! # Channel Registry
//!
//! Per-instance channel state keyed by [`ComponentInstanceId`].
//!
//! ## Overview
//!
//! Every operation the bridge accepts for an instance reads or writes one
//! [`ChannelEntry`]. The entry carries the hub handle once it resolves, the
//! listener bookkeeping (buffered vs. active), the registration phase and the
//! cancellation token threaded through every idle-gated poll for that instance.
//!
//! ## Locking
//!
//! Each entry guards its [`ChannelState`] with a `parking_lot::Mutex`. The
//! lock is never held across an `.await`; hub primitives that are synchronous
//! (subscribe, unsubscribe) are called with the lock held so the listener maps
//! and the hub's subscriptions move together.
//!
//! ## Invariants
//!
//! - `pending_listeners` and `active_handles` never share a [`ListenerId`]
//! - once `handle` is set it is never replaced for the life of the entry
//! - the phase is changed only through [`ChannelEntry::apply`]

use crate::component::{ObserverId, PortletElement};
use crate::error::{BridgeError, BridgeResult};
use crate::logging;
use crate::models::{ComponentInstanceId, ListenerId};
use crate::state_machine::{self, RegistrationEvent, RegistrationPhase};
use crate::substrate::{HubHandle, SubscriptionHandle};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Element a hub registration was bound to
#[derive(Clone)]
pub struct ElementBinding {
    /// Element providing the client-registry lookup
    pub element: Arc<dyn PortletElement>,
    /// Application id read from the target element
    pub app_id: Option<String>,
}

/// Observer attached to a target element until the channel is established
#[derive(Clone)]
pub(crate) struct UpdateSubscription {
    pub(crate) element: Arc<dyn PortletElement>,
    pub(crate) observer_id: ObserverId,
}

/// Mutable channel state of one component instance
#[derive(Default)]
pub struct ChannelState {
    pub(crate) handle: Option<Arc<dyn HubHandle>>,
    pub(crate) pending_listeners: HashMap<ListenerId, String>,
    pub(crate) active_handles: HashMap<ListenerId, SubscriptionHandle>,
    pub(crate) phase: RegistrationPhase,
    pub(crate) binding: Option<ElementBinding>,
    pub(crate) state_change_subscription: Option<SubscriptionHandle>,
    pub(crate) update_subscription: Option<UpdateSubscription>,
}

impl ChannelState {
    pub fn handle(&self) -> Option<&Arc<dyn HubHandle>> {
        self.handle.as_ref()
    }

    pub fn phase(&self) -> RegistrationPhase {
        self.phase
    }

    pub fn binding(&self) -> Option<&ElementBinding> {
        self.binding.as_ref()
    }

    pub fn is_pending(&self, listener_id: &ListenerId) -> bool {
        self.pending_listeners.contains_key(listener_id)
    }

    pub fn is_active(&self, listener_id: &ListenerId) -> bool {
        self.active_handles.contains_key(listener_id)
    }

    /// Event type a buffered listener will subscribe to once the channel exists
    pub fn pending_event_type(&self, listener_id: &ListenerId) -> Option<&str> {
        self.pending_listeners.get(listener_id).map(String::as_str)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_listeners.len()
    }

    pub fn active_count(&self) -> usize {
        self.active_handles.len()
    }

    pub fn has_state_change_subscription(&self) -> bool {
        self.state_change_subscription.is_some()
    }
}

impl fmt::Debug for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelState")
            .field("phase", &self.phase)
            .field("has_handle", &self.handle.is_some())
            .field("pending_listeners", &self.pending_listeners)
            .field("active_listeners", &self.active_handles.keys())
            .field(
                "app_id",
                &self.binding.as_ref().and_then(|b| b.app_id.as_deref()),
            )
            .finish()
    }
}

/// Registry slot for one component instance
pub struct ChannelEntry {
    instance_id: ComponentInstanceId,
    state: Mutex<ChannelState>,
    phase_tx: watch::Sender<RegistrationPhase>,
    cancel: CancellationToken,
    created_at: DateTime<Utc>,
}

impl ChannelEntry {
    pub fn new(instance_id: ComponentInstanceId) -> Self {
        let (phase_tx, _) = watch::channel(RegistrationPhase::default());
        Self {
            instance_id,
            state: Mutex::new(ChannelState::default()),
            phase_tx,
            cancel: CancellationToken::new(),
            created_at: Utc::now(),
        }
    }

    pub fn instance_id(&self) -> &ComponentInstanceId {
        &self.instance_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Lock the channel state. Never hold the guard across an `.await`.
    pub fn lock(&self) -> MutexGuard<'_, ChannelState> {
        self.state.lock()
    }

    pub fn handle(&self) -> Option<Arc<dyn HubHandle>> {
        self.state.lock().handle.clone()
    }

    /// Handle for operations that require an established channel
    pub fn require_handle(&self) -> BridgeResult<Arc<dyn HubHandle>> {
        self.handle()
            .ok_or_else(|| BridgeError::not_established(&self.instance_id))
    }

    pub fn phase(&self) -> RegistrationPhase {
        self.state.lock().phase
    }

    /// Apply a registration event to the locked state and notify phase watchers
    pub fn apply(
        &self,
        state: &mut ChannelState,
        event: RegistrationEvent,
    ) -> BridgeResult<RegistrationPhase> {
        let from = state.phase;
        let next = state_machine::transition(from, event)?;
        state.phase = next;
        self.phase_tx.send_replace(next);
        debug!(
            instance_id = %self.instance_id,
            from = %from,
            event = %event,
            to = %next,
            "Registration phase changed"
        );
        Ok(next)
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<RegistrationPhase> {
        self.phase_tx.subscribe()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for ChannelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelEntry")
            .field("instance_id", &self.instance_id)
            .field("state", &*self.state.lock())
            .field("disposed", &self.is_disposed())
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Instance-keyed registry of channel entries
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    entries: DashMap<ComponentInstanceId, Arc<ChannelEntry>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry for `instance_id`, failing when one already exists
    pub fn create(&self, instance_id: &ComponentInstanceId) -> BridgeResult<Arc<ChannelEntry>> {
        match self.entries.entry(instance_id.clone()) {
            Entry::Occupied(_) => Err(BridgeError::InstanceAlreadyExists {
                instance_id: instance_id.clone(),
            }),
            Entry::Vacant(vacant) => {
                let entry = Arc::new(ChannelEntry::new(instance_id.clone()));
                vacant.insert(Arc::clone(&entry));
                logging::log_channel_operation("create", instance_id.as_str(), "created", None);
                Ok(entry)
            }
        }
    }

    pub fn get(&self, instance_id: &ComponentInstanceId) -> Option<Arc<ChannelEntry>> {
        self.entries
            .get(instance_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Entry for `instance_id`, created on first reference
    pub fn get_or_create(&self, instance_id: &ComponentInstanceId) -> Arc<ChannelEntry> {
        let entry = self
            .entries
            .entry(instance_id.clone())
            .or_insert_with(|| {
                debug!(instance_id = %instance_id, "Channel entry created on first reference");
                Arc::new(ChannelEntry::new(instance_id.clone()))
            });
        Arc::clone(entry.value())
    }

    /// Remove the entry and cancel everything waiting on it
    pub fn dispose(&self, instance_id: &ComponentInstanceId) -> Option<Arc<ChannelEntry>> {
        let (_, entry) = self.entries.remove(instance_id)?;
        entry.cancel.cancel();
        logging::log_channel_operation("dispose", instance_id.as_str(), "disposed", None);
        Some(entry)
    }

    pub fn contains(&self, instance_id: &ComponentInstanceId) -> bool {
        self.entries.contains_key(instance_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<ComponentInstanceId> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }
}
