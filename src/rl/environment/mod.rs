//! Trading Environment
//!
//! The account state machine the agent acts on.

mod account;

pub use account::{FillContext, Holding, TradeRecord, TradeSide, TradingAccount, Transition};
