//! # Orchestration
//!
//! Getting a component instance from "scripts requested" to "hub channel
//! established":
//!
//! - [`Bootstrap`] loads missing scripts and waits for the registration script
//! - [`HubRegistrar`] binds elements and establishes channels on first update

pub mod bootstrap;
pub mod registrar;

pub use bootstrap::Bootstrap;
pub use registrar::HubRegistrar;
