//! # Bridge Constants
//!
//! Wire-level names shared with the portal side of the component and the
//! default cadences of the bridge's poll loops.

/// Parameter names the server side reads from relayed hub events
pub mod params {
    /// Hub event type that triggered the relay
    pub const EVENT_TYPE: &str = "vaadin.ev";
    /// Listener uid the event was delivered to
    pub const LISTENER_UID: &str = "vaadin.uid";
    /// Name of the browser window hosting the component
    pub const WINDOW_NAME: &str = "vaadin.wn";
}

/// Hub event names
pub mod hub_events {
    /// Render state change notification; subscribed with a placeholder at establishment
    pub const STATE_CHANGE: &str = "portlet.onStateChange";
}

pub mod defaults {
    pub const READINESS_MAX_ATTEMPTS: u32 = 100;
    pub const READINESS_INTERVAL_MS: u64 = 50;
    pub const IDLE_POLL_INTERVAL_MS: u64 = 10;
    pub const EVENT_CHANNEL_CAPACITY: usize = 256;
}
