//! Reinforcement Learning Module
//!
//! Tabular Q-learning over a quantized `(volume, price, position, balance)`
//! state, trading a simulated all-in account.
//!
//! # Components
//!
//! - **State Representation**: 2-decimal quantization into hashable keys
//! - **Action Space**: Hold / Buy / Sell
//! - **Q-table**: JSON persistence with legacy key formats
//! - **Drivers**: historical replay training and an online live loop

pub mod algorithms;
pub mod config;
pub mod core;
pub mod environment;
pub mod integration;
pub mod table;
pub mod training;

pub use algorithms::QLearningAgent;
pub use config::QLearningConfig;
pub use core::{Action, Observation, StateCodec, StateKey, StateVector, NUM_ACTIONS};
pub use environment::{TradeRecord, TradeSide, TradingAccount, Transition};
pub use integration::{AlertSink, LiveDriver, LiveFeed, LiveObservation, LiveSettings};
pub use table::QTable;
pub use training::{EpisodeStats, ReplayDriver, ReplayReport};
