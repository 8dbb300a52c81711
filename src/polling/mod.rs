//! # Polling Primitives
//!
//! Cancellable, timer-scheduled poll loops the bridge uses wherever it has to
//! wait on something it cannot subscribe to:
//!
//! - [`ReadinessGate`] waits for a dependency marker with a bounded attempt budget
//! - [`IdleGatedExecutor`] waits for a hub handle to report no outstanding operation
//!
//! Neither loop ever blocks the runtime; every retry is a scheduled sleep.

pub mod idle;
pub mod readiness;

pub use idle::IdleGatedExecutor;
pub use readiness::ReadinessGate;
