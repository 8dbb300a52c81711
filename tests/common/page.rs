use super::Journal;
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use portlet_hub_bridge::component::{
    ClientRuntime, ObserverId, Page, PortletElement, ScriptLoader, UpdateObserver,
};
use portlet_hub_bridge::models::ComponentInstanceId;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// Client runtime counting forced polls
pub struct FakeClient {
    journal: Journal,
    polls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeClient {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            polls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn fail_polls(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ClientRuntime for FakeClient {
    async fn poll(&self) -> anyhow::Result<()> {
        self.journal.lock().push("client_poll".to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("uidl request failed"));
        }
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Embedded component element with an observer list and a client registry
pub struct FakeElement {
    portlet_id: Option<ComponentInstanceId>,
    app_id: Option<String>,
    observers: Mutex<Vec<(ObserverId, Arc<dyn UpdateObserver>)>>,
    clients: Mutex<HashMap<String, Arc<FakeClient>>>,
}

impl FakeElement {
    pub fn new(portlet_id: Option<ComponentInstanceId>, app_id: Option<&str>) -> Self {
        Self {
            portlet_id,
            app_id: app_id.map(str::to_string),
            observers: Mutex::new(Vec::new()),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn add_client(&self, app_id: &str, client: Arc<FakeClient>) {
        self.clients.lock().insert(app_id.to_string(), client);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Notify every observer that a server update was applied
    pub fn server_update(&self) {
        let observers: Vec<_> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer.after_server_update();
        }
    }
}

impl PortletElement for FakeElement {
    fn portlet_id(&self) -> Option<ComponentInstanceId> {
        self.portlet_id.clone()
    }

    fn app_id(&self) -> Option<String> {
        self.app_id.clone()
    }

    fn subscribe_after_update(&self, observer: Arc<dyn UpdateObserver>) -> ObserverId {
        let id = ObserverId::new();
        self.observers.lock().push((id, observer));
        id
    }

    fn unsubscribe_after_update(&self, observer_id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(id, _)| *id != observer_id);
        observers.len() != before
    }

    fn client(&self, app_id: &str) -> Option<Arc<dyn ClientRuntime>> {
        self.clients
            .lock()
            .get(app_id)
            .map(|client| Arc::clone(client) as Arc<dyn ClientRuntime>)
    }
}

/// Counts updates; stands in for a hook someone else attached to the element
#[derive(Default)]
pub struct CountingObserver {
    pub updates: AtomicUsize,
}

impl UpdateObserver for CountingObserver {
    fn after_server_update(&self) {
        self.updates.fetch_add(1, Ordering::SeqCst);
    }
}

/// Portal page holding component elements
pub struct FakePage {
    journal: Journal,
    window_name: String,
    elements: Mutex<Vec<(String, Arc<FakeElement>)>>,
    defined: watch::Sender<bool>,
    definition_error: Mutex<Option<String>>,
    reloads: AtomicUsize,
}

impl FakePage {
    pub fn new(journal: Journal, window_name: &str) -> Self {
        let (defined, _) = watch::channel(true);
        Self {
            journal,
            window_name: window_name.to_string(),
            elements: Mutex::new(Vec::new()),
            defined,
            definition_error: Mutex::new(None),
            reloads: AtomicUsize::new(0),
        }
    }

    pub fn add_element(&self, tag: &str, element: Arc<FakeElement>) {
        self.elements.lock().push((tag.to_string(), element));
    }

    /// Make `when_defined` wait until [`FakePage::define`]
    pub fn undefine(&self) {
        self.defined.send_replace(false);
    }

    pub fn define(&self) {
        self.defined.send_replace(true);
    }

    pub fn fail_definition(&self, reason: &str) {
        *self.definition_error.lock() = Some(reason.to_string());
    }

    pub fn reloads(&self) -> usize {
        self.reloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Page for FakePage {
    fn window_name(&self) -> String {
        self.window_name.clone()
    }

    fn reload(&self) {
        self.journal.lock().push("reload".to_string());
        self.reloads.fetch_add(1, Ordering::SeqCst);
    }

    fn query_elements(&self, tag: &str) -> Vec<Arc<dyn PortletElement>> {
        self.elements
            .lock()
            .iter()
            .filter(|(element_tag, _)| element_tag == tag)
            .map(|(_, element)| Arc::clone(element) as Arc<dyn PortletElement>)
            .collect()
    }

    async fn when_defined(&self, _tag: &str) -> anyhow::Result<()> {
        let definition_error = self.definition_error.lock().clone();
        if let Some(reason) = definition_error {
            return Err(anyhow!(reason));
        }
        let mut defined = self.defined.subscribe();
        defined
            .wait_for(|defined| *defined)
            .await
            .map(|_| ())
            .map_err(|e| anyhow!(e))
    }
}

/// Script loader over an in-memory set of present URLs
#[derive(Default)]
pub struct FakeScriptLoader {
    present: Mutex<Vec<String>>,
    loads: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl FakeScriptLoader {
    pub fn with_present(urls: &[&str]) -> Self {
        let loader = Self::default();
        loader
            .present
            .lock()
            .extend(urls.iter().map(|url| url.to_string()));
        loader
    }

    pub fn fail_on(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().clone()
    }
}

#[async_trait]
impl ScriptLoader for FakeScriptLoader {
    fn loaded_scripts(&self) -> Vec<String> {
        self.present.lock().clone()
    }

    async fn load(&self, url: &str) -> anyhow::Result<()> {
        self.loads.lock().push(url.to_string());
        if self.failing.lock().contains(url) {
            return Err(anyhow!("404 Not Found"));
        }
        tokio::task::yield_now().await;
        self.present.lock().push(url.to_string());
        Ok(())
    }
}
