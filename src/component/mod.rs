//! # UI Component and Page Seams
//!
//! The embedded component is consumed through an observer interface for its
//! post-update notifications and a client-registry lookup used to force a
//! resynchronizing poll. The page supplies element lookup, the window name,
//! reloads and custom-element definition. Observers are additive: subscribing
//! never displaces an observer someone else attached.

use crate::models::ComponentInstanceId;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Identifies one observer subscription on a portlet element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ObserverId {
    fn default() -> Self {
        Self::new()
    }
}

/// Notified after the component applied a server update
pub trait UpdateObserver: Send + Sync {
    fn after_server_update(&self);
}

/// Client runtime of one embedded application
#[async_trait]
pub trait ClientRuntime: Send + Sync {
    /// Issue a synchronization round-trip so rendered state catches up with the server
    async fn poll(&self) -> anyhow::Result<()>;
}

/// An embedded portlet component element on the page
pub trait PortletElement: Send + Sync {
    /// Value of the element's `data-portlet-id` attribute
    fn portlet_id(&self) -> Option<ComponentInstanceId>;

    /// Application id keying the element's client runtime in the client registry
    fn app_id(&self) -> Option<String>;

    fn subscribe_after_update(&self, observer: Arc<dyn UpdateObserver>) -> ObserverId;

    /// Returns false when the observer was not subscribed
    fn unsubscribe_after_update(&self, observer_id: ObserverId) -> bool;

    /// Client-registry lookup
    fn client(&self, app_id: &str) -> Option<Arc<dyn ClientRuntime>>;
}

/// The portal page hosting the components
#[async_trait]
pub trait Page: Send + Sync {
    /// Name of the browser window, sent along with relayed events
    fn window_name(&self) -> String;

    fn reload(&self);

    /// All elements currently on the page for a custom element tag
    fn query_elements(&self, tag: &str) -> Vec<Arc<dyn PortletElement>>;

    /// Resolves once the custom element for `tag` is defined
    async fn when_defined(&self, tag: &str) -> anyhow::Result<()>;
}

/// Script presence and loading on the page
#[async_trait]
pub trait ScriptLoader: Send + Sync {
    /// URLs of scripts already present on the page
    fn loaded_scripts(&self) -> Vec<String>;

    async fn load(&self, url: &str) -> anyhow::Result<()>;
}
