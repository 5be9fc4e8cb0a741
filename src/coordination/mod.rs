//! Coordination
//!
//! Cooperative cancellation shared by the drivers and the signal handler.

pub mod shutdown;

pub use shutdown::{Shutdown, ShutdownSignal};
