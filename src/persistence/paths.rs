//! Per-symbol file layout
//!
//! Every artifact a symbol produces lives at a fixed place under the log and
//! data directories. The layout is resolved once and handed to the drivers.

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

/// Format of the timestamp suffix on interrupt snapshots
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Resolved artifact paths for one symbol and candle interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolPaths {
    pub symbol: String,
    /// `<log-dir>/<symbol>_q_table.json`
    pub q_table: PathBuf,
    /// `<log-dir>/<symbol>_trades.json`, last replay episode
    pub trade_log: PathBuf,
    /// `<log-dir>/<symbol>_live_trades.json`, last live session
    pub live_trade_log: PathBuf,
    /// `<log-dir>/<symbol>_decisions_log.csv`
    pub decision_log: PathBuf,
    /// Directory receiving timestamped Q-table snapshots
    pub snapshot_dir: PathBuf,
    /// `<data-dir>/<SYMBOL>_<interval>.csv`
    pub dataset: PathBuf,
    /// `<data-dir>/<SYMBOL>_<interval>_stat.csv`
    pub stats: PathBuf,
}

impl SymbolPaths {
    pub fn resolve(log_dir: &Path, data_dir: &Path, symbol: &str, interval: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            q_table: log_dir.join(format!("{symbol}_q_table.json")),
            trade_log: log_dir.join(format!("{symbol}_trades.json")),
            live_trade_log: log_dir.join(format!("{symbol}_live_trades.json")),
            decision_log: log_dir.join(format!("{symbol}_decisions_log.csv")),
            snapshot_dir: log_dir.to_path_buf(),
            dataset: data_dir.join(format!("{symbol}_{interval}.csv")),
            stats: data_dir.join(format!("{symbol}_{interval}_stat.csv")),
        }
    }

    /// `<snapshot-dir>/<symbol>_q_table_<YYYYmmdd_HHMMSS>.json`
    pub fn snapshot_at<Tz>(&self, at: &DateTime<Tz>) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        self.snapshot_dir.join(format!(
            "{}_q_table_{}.json",
            self.symbol,
            at.format(SNAPSHOT_TIME_FORMAT)
        ))
    }

    /// Snapshot path stamped with the local wall clock
    pub fn snapshot_now(&self) -> PathBuf {
        self.snapshot_at(&chrono::Local::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_default_layout() {
        let paths = SymbolPaths::resolve(Path::new("logs"), Path::new("data"), "BTCUSDT", "5m");

        assert_eq!(paths.q_table, PathBuf::from("logs/BTCUSDT_q_table.json"));
        assert_eq!(paths.trade_log, PathBuf::from("logs/BTCUSDT_trades.json"));
        assert_eq!(
            paths.live_trade_log,
            PathBuf::from("logs/BTCUSDT_live_trades.json")
        );
        assert_eq!(
            paths.decision_log,
            PathBuf::from("logs/BTCUSDT_decisions_log.csv")
        );
        assert_eq!(paths.dataset, PathBuf::from("data/BTCUSDT_5m.csv"));
        assert_eq!(paths.stats, PathBuf::from("data/BTCUSDT_5m_stat.csv"));
    }

    #[test]
    fn test_snapshot_name() {
        let paths = SymbolPaths::resolve(Path::new("logs"), Path::new("data"), "ETHUSDT", "1h");
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(
            paths.snapshot_at(&at),
            PathBuf::from("logs/ETHUSDT_q_table_20240309_140507.json")
        );
    }
}
