#![allow(dead_code)]

pub mod hub;
pub mod page;
pub mod strategies;

pub use hub::*;
pub use page::*;

use parking_lot::Mutex;
use portlet_hub_bridge::events::{BridgeEvent, PublishedEvent};
use portlet_hub_bridge::{BridgeConfig, ComponentInstanceId, PortletBridge};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Ordered record of hub, client and page calls shared by the fakes
pub type Journal = Arc<Mutex<Vec<String>>>;

pub const TAG: &str = "address-book-portlet";
pub const WINDOW_NAME: &str = "portal-window";

/// Bridge wired to in-memory hub and page fakes
pub struct TestHarness {
    pub bridge: PortletBridge,
    pub hub: Arc<FakeHub>,
    pub page: Arc<FakePage>,
    pub journal: Journal,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let hub = Arc::new(FakeHub::new(Arc::clone(&journal)));
        let page = Arc::new(FakePage::new(Arc::clone(&journal), WINDOW_NAME));
        let bridge = PortletBridge::new(config, hub.clone(), page.clone());
        Self {
            bridge,
            hub,
            page,
            journal,
        }
    }

    /// Put a component element for `instance_id` on the page, with a client for `app_id`
    pub fn add_portlet(&self, instance_id: &ComponentInstanceId, app_id: &str) -> Arc<FakeElement> {
        let element = Arc::new(FakeElement::new(Some(instance_id.clone()), Some(app_id)));
        element.add_client(app_id, Arc::new(FakeClient::new(Arc::clone(&self.journal))));
        self.page.add_element(TAG, Arc::clone(&element));
        element
    }

    /// Bind and establish the channel for a fresh portlet element
    pub async fn establish(&self, instance_id: &ComponentInstanceId) -> Arc<FakeElement> {
        let element = self.add_portlet(instance_id, &format!("app-{instance_id}"));
        self.bridge
            .register_hub(TAG, instance_id, element.clone())
            .expect("register_hub");
        element.server_update();
        tokio::time::timeout(
            Duration::from_secs(5),
            self.bridge.wait_until_established(instance_id),
        )
        .await
        .expect("establishment timed out")
        .expect("establishment failed");
        element
    }

    pub fn clear_journal(&self) {
        self.journal.lock().clear();
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().clone()
    }
}

/// Receive bridge events until one matches `predicate`
pub async fn wait_for_event<P>(
    receiver: &mut broadcast::Receiver<PublishedEvent>,
    mut predicate: P,
) -> BridgeEvent
where
    P: FnMut(&BridgeEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match receiver.recv().await {
                Ok(published) if predicate(&published.event) => return published.event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for bridge event")
}

pub fn params(value: serde_json::Value) -> portlet_hub_bridge::Parameters {
    value.as_object().cloned().expect("object literal")
}
