//! Persistence
//!
//! File layout and writers for the artifacts a symbol produces:
//! - Per-symbol path resolution and snapshot naming
//! - Live decision log (CSV, append-only)
//! - Trade log (JSON, replaced per episode or session)

pub mod decision_log;
pub mod paths;
pub mod trade_log;

pub use decision_log::{
    local_timestamp, DecisionLog, DecisionRecord, DECISION_LOG_HEADER, TIMESTAMP_FORMAT,
};
pub use paths::{SymbolPaths, SNAPSHOT_TIME_FORMAT};
pub use trade_log::{load_trades, save_trades};
