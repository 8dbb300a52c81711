//! # Bridge Data Model
//!
//! Identifiers, hub parameter objects and render state shared by every layer
//! of the bridge.

pub mod identifiers;
pub mod parameters;
pub mod render_state;

// Re-export core models for easy access
pub use identifiers::{ComponentInstanceId, ListenerId};
pub use parameters::{merge_parameters, single_value, Parameters};
pub use render_state::{PortletMode, RenderState, WindowState};
