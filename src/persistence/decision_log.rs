//! Live decision log
//!
//! One CSV row per live tick, appended to `<log-dir>/<symbol>_decisions_log.csv`.
//! The header is written when the file is first created.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::rl::core::Action;

pub const DECISION_LOG_HEADER: &str =
    "Timestamp,Symbol,Action,Price,Volume,BestBid,BestAsk,Spread,Position,Balance,Reward";

/// Wall-clock format used in decision rows and live trade records
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in `TIMESTAMP_FORMAT`
pub fn local_timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// One live decision
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRecord {
    /// Local wall clock, `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    pub symbol: String,
    pub action: Action,
    pub price: f64,
    pub volume: f64,
    pub best_bid: f64,
    pub best_ask: f64,
    pub spread: f64,
    pub position: f64,
    pub balance: f64,
    pub reward: f64,
}

impl DecisionRecord {
    fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{:.2},{:.5},{:.2},{:.2},{:.2},{:.5},{:.2},{:.2}",
            self.timestamp,
            self.symbol,
            self.action.as_str(),
            self.price,
            self.volume,
            self.best_bid,
            self.best_ask,
            self.spread,
            self.position,
            self.balance,
            self.reward,
        )
    }
}

/// Append-only CSV writer for decisions
#[derive(Debug, Clone)]
pub struct DecisionLog {
    path: PathBuf,
}

impl DecisionLog {
    /// Open the log, creating it with a header if it does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let mut file = fs::File::create(&path)?;
            writeln!(file, "{}", DECISION_LOG_HEADER)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &DecisionRecord) -> Result<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", record.to_csv_row())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(action: Action, reward: f64) -> DecisionRecord {
        DecisionRecord {
            timestamp: "2024-05-01 12:00:00".to_string(),
            symbol: "BTCUSDT".to_string(),
            action,
            price: 64_000.5,
            volume: 0.00125,
            best_bid: 64_000.0,
            best_ask: 64_001.0,
            spread: 1.0,
            position: 0.0,
            balance: 1000.0,
            reward,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = std::env::temp_dir().join(format!("volbot-decisions-{}", uuid::Uuid::new_v4()));
        let path = dir.join("BTCUSDT_decisions_log.csv");

        let log = DecisionLog::open(&path).unwrap();
        log.append(&record(Action::Hold, 0.0)).unwrap();

        // reopening an existing log must not repeat the header
        let log = DecisionLog::open(&path).unwrap();
        log.append(&record(Action::Sell, 12.345)).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], DECISION_LOG_HEADER);
        assert_eq!(
            lines[1],
            "2024-05-01 12:00:00,BTCUSDT,HOLD,64000.50,0.00125,64000.00,64001.00,1.00,0.00000,1000.00,0.00"
        );
        assert!(lines[2].contains(",SELL,"));
        assert!(lines[2].ends_with(",12.35") || lines[2].ends_with(",12.34"));

        let _ = fs::remove_dir_all(&dir);
    }
}
