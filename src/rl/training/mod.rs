//! Training
//!
//! Offline training over historical rows.

pub mod replay;

pub use replay::{EpisodeStats, ReplayDriver, ReplayReport};
