pub mod publisher;
pub mod relay;
pub mod types;

// Re-export key types for convenience
pub use publisher::{EventPublisher, PublishedEvent};
pub use relay::{EventRelay, InboundContext};
pub use types::{names, BridgeEvent};
