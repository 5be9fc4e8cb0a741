pub mod adapters;
pub mod analysis;
pub mod cli;
pub mod collector;
pub mod config;
pub mod coordination;
pub mod error;
pub mod persistence;
pub mod rl;

pub use adapters::TelegramNotifier;
pub use collector::{BinanceClient, BinanceLiveFeed};
pub use config::AppConfig;
pub use coordination::{Shutdown, ShutdownSignal};
pub use error::{Result, VolbotError};
pub use persistence::SymbolPaths;
pub use rl::{LiveDriver, QLearningAgent, QTable, ReplayDriver, TradingAccount};
