use super::Journal;
use async_trait::async_trait;
use parking_lot::Mutex;
use portlet_hub_bridge::models::{ComponentInstanceId, Parameters, RenderState};
use portlet_hub_bridge::substrate::{
    EventCallback, HubHandle, PortletHub, SubscriptionHandle, SubstrateError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Scripted answer of `is_in_progress`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Busy,
    Idle,
    Undefined,
    Fail,
}

/// Render state submission together with the progress check count at that moment
#[derive(Debug, Clone)]
pub struct RecordedRenderState {
    pub state: RenderState,
    pub after_checks: usize,
}

#[derive(Clone)]
struct Listener {
    event_type: String,
    callback: EventCallback,
}

/// In-memory hub handle recording every primitive it receives
pub struct FakeHubHandle {
    journal: Journal,
    progress: Mutex<VecDeque<Progress>>,
    always_busy: AtomicBool,
    progress_checks: AtomicUsize,
    render_states: Mutex<Vec<RecordedRenderState>>,
    dispatched: Mutex<Vec<(String, Parameters)>>,
    actions: Mutex<Vec<Parameters>>,
    listeners: Mutex<HashMap<String, Listener>>,
    removed: Mutex<Vec<SubscriptionHandle>>,
    next_token: AtomicUsize,
    fail_actions: AtomicBool,
    fail_subscriptions: AtomicBool,
}

impl FakeHubHandle {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            progress: Mutex::new(VecDeque::new()),
            always_busy: AtomicBool::new(false),
            progress_checks: AtomicUsize::new(0),
            render_states: Mutex::new(Vec::new()),
            dispatched: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
            listeners: Mutex::new(HashMap::new()),
            removed: Mutex::new(Vec::new()),
            next_token: AtomicUsize::new(0),
            fail_actions: AtomicBool::new(false),
            fail_subscriptions: AtomicBool::new(false),
        }
    }

    /// Queue progress answers; the handle reports idle once they run out
    pub fn script_progress(&self, replies: &[Progress]) {
        self.progress.lock().extend(replies.iter().copied());
    }

    pub fn set_always_busy(&self, busy: bool) {
        self.always_busy.store(busy, Ordering::SeqCst);
    }

    pub fn fail_actions(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    pub fn fail_subscriptions(&self, fail: bool) {
        self.fail_subscriptions.store(fail, Ordering::SeqCst);
    }

    pub fn progress_checks(&self) -> usize {
        self.progress_checks.load(Ordering::SeqCst)
    }

    pub fn render_states(&self) -> Vec<RecordedRenderState> {
        self.render_states.lock().clone()
    }

    pub fn dispatched(&self) -> Vec<(String, Parameters)> {
        self.dispatched.lock().clone()
    }

    pub fn actions(&self) -> Vec<Parameters> {
        self.actions.lock().clone()
    }

    /// Event types of the live subscriptions
    pub fn subscribed_event_types(&self) -> Vec<String> {
        let mut types: Vec<_> = self
            .listeners
            .lock()
            .values()
            .map(|listener| listener.event_type.clone())
            .collect();
        types.sort();
        types
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn removed(&self) -> Vec<SubscriptionHandle> {
        self.removed.lock().clone()
    }

    /// Deliver an event to every subscription for `event_type`, as the hub would
    pub fn emit(&self, event_type: &str, payload: Option<Parameters>) -> usize {
        let callbacks: Vec<EventCallback> = self
            .listeners
            .lock()
            .values()
            .filter(|listener| listener.event_type == event_type)
            .map(|listener| Arc::clone(&listener.callback))
            .collect();
        for callback in &callbacks {
            callback(event_type, payload.as_ref());
        }
        callbacks.len()
    }
}

#[async_trait]
impl HubHandle for FakeHubHandle {
    fn is_in_progress(&self) -> Result<Option<bool>, SubstrateError> {
        self.progress_checks.fetch_add(1, Ordering::SeqCst);
        let reply = if self.always_busy.load(Ordering::SeqCst) {
            Progress::Busy
        } else {
            self.progress.lock().pop_front().unwrap_or(Progress::Idle)
        };
        self.journal.lock().push(format!("check:{reply:?}").to_lowercase());
        match reply {
            Progress::Busy => Ok(Some(true)),
            Progress::Idle => Ok(Some(false)),
            Progress::Undefined => Ok(None),
            Progress::Fail => Err(SubstrateError::Unavailable("isInProgress threw".into())),
        }
    }

    fn new_state(&self) -> RenderState {
        RenderState::default()
    }

    fn set_render_state(&self, state: RenderState) -> Result<(), SubstrateError> {
        self.journal.lock().push("set_render_state".to_string());
        self.render_states.lock().push(RecordedRenderState {
            state,
            after_checks: self.progress_checks(),
        });
        Ok(())
    }

    fn new_parameters(&self) -> Parameters {
        Parameters::new()
    }

    fn dispatch_client_event(
        &self,
        event_type: &str,
        parameters: Parameters,
    ) -> Result<(), SubstrateError> {
        self.dispatched
            .lock()
            .push((event_type.to_string(), parameters));
        Ok(())
    }

    async fn action(&self, parameters: Parameters) -> Result<(), SubstrateError> {
        self.journal.lock().push("action".to_string());
        if self.fail_actions.load(Ordering::SeqCst) {
            return Err(SubstrateError::Rejected("action refused".into()));
        }
        self.actions.lock().push(parameters);
        Ok(())
    }

    fn add_event_listener(
        &self,
        event_type: &str,
        callback: EventCallback,
    ) -> Result<SubscriptionHandle, SubstrateError> {
        if self.fail_subscriptions.load(Ordering::SeqCst) {
            return Err(SubstrateError::Rejected("addEventListener refused".into()));
        }
        let token = format!("sub-{}", self.next_token.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().insert(
            token.clone(),
            Listener {
                event_type: event_type.to_string(),
                callback,
            },
        );
        Ok(SubscriptionHandle::new(token))
    }

    fn remove_event_listener(&self, handle: SubscriptionHandle) -> Result<(), SubstrateError> {
        if self.listeners.lock().remove(handle.token()).is_none() {
            return Err(SubstrateError::Rejected(format!(
                "unknown subscription {}",
                handle.token()
            )));
        }
        self.removed.lock().push(handle);
        Ok(())
    }
}

/// Portlet hub handing out one [`FakeHubHandle`] per instance
pub struct FakeHub {
    journal: Journal,
    handles: Mutex<HashMap<ComponentInstanceId, Arc<FakeHubHandle>>>,
    register_calls: AtomicUsize,
    failures_left: AtomicUsize,
    hold: AtomicBool,
    release: Notify,
}

impl FakeHub {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            handles: Mutex::new(HashMap::new()),
            register_calls: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            hold: AtomicBool::new(false),
            release: Notify::new(),
        }
    }

    /// Handle for `instance_id`, created on first use so tests can script it up front
    pub fn handle(&self, instance_id: &ComponentInstanceId) -> Arc<FakeHubHandle> {
        Arc::clone(
            self.handles
                .lock()
                .entry(instance_id.clone())
                .or_insert_with(|| Arc::new(FakeHubHandle::new(Arc::clone(&self.journal)))),
        )
    }

    pub fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    /// Reject the next `count` registrations
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Keep registrations pending until [`FakeHub::release`]
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_waiters();
        self.release.notify_one();
    }
}

#[async_trait]
impl PortletHub for FakeHub {
    async fn register(
        &self,
        instance_id: &ComponentInstanceId,
    ) -> Result<Arc<dyn HubHandle>, SubstrateError> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().push(format!("register:{instance_id}"));

        if self.hold.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(SubstrateError::Rejected("portlet not allowed".into()));
        }

        let handle: Arc<dyn HubHandle> = self.handle(instance_id);
        Ok(handle)
    }
}
