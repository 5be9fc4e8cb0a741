//! Live Integration
//!
//! Connects the agent to live market data and alert delivery.

pub mod live;

pub use live::{AlertSink, LiveDriver, LiveFeed, LiveObservation, LiveSettings, LiveSummary};
