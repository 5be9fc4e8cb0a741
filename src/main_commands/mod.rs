//! One handler per sub-command

use volbot::config::AppConfig;
use volbot::persistence::SymbolPaths;

pub(crate) mod fetch;
pub(crate) mod live;
pub(crate) mod stats;
pub(crate) mod train;
pub(crate) mod watch;

/// Resolved configuration shared by every handler
pub(crate) struct CommandContext {
    pub config: AppConfig,
    pub symbol: String,
    pub interval: String,
    pub paths: SymbolPaths,
}

impl CommandContext {
    pub fn new(config: AppConfig, symbol: &str, interval: &str) -> Self {
        let paths = config.paths.for_symbol(symbol, interval);
        Self {
            config,
            symbol: symbol.to_string(),
            interval: interval.to_string(),
            paths,
        }
    }
}
