//! Trade log
//!
//! The fills of one episode or session, written as a pretty-printed JSON
//! array. Each save replaces the previous file.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::rl::environment::TradeRecord;

/// Write `trades` to `path`, creating the parent directory
pub fn save_trades(path: &Path, trades: &[TradeRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(trades)?;
    fs::write(path, content)?;

    debug!("Saved {} trades to {:?}", trades.len(), path);
    Ok(())
}

/// Read a trade log; an absent file is an empty log
pub fn load_trades(path: &Path) -> Result<Vec<TradeRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::environment::TradeSide;

    #[test]
    fn test_save_replaces_previous_log() {
        let dir = std::env::temp_dir().join(format!("volbot-trades-{}", uuid::Uuid::new_v4()));
        let path = dir.join("BTCUSDT_trades.json");

        let sell = TradeRecord {
            step: 3,
            timestamp: "2024-01-01 00:15:00".to_string(),
            side: TradeSide::Sell,
            price: 105.0,
            volume: 2.0,
            balance: 210.0,
            profit: Some(10.0),
        };
        let buy = TradeRecord {
            step: 1,
            side: TradeSide::Buy,
            balance: 0.0,
            profit: None,
            ..sell.clone()
        };

        save_trades(&path, &[buy.clone(), sell.clone()]).unwrap();
        assert_eq!(load_trades(&path).unwrap(), vec![buy, sell.clone()]);

        save_trades(&path, &[sell.clone()]).unwrap();
        assert_eq!(load_trades(&path).unwrap(), vec![sell]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let path = std::env::temp_dir().join(format!("volbot-none-{}.json", uuid::Uuid::new_v4()));
        assert!(load_trades(&path).unwrap().is_empty());
    }
}
