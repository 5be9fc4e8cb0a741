//! Volume statistics and order-book volume alerts
//!
//! Quartiles and deciles over a dataset's volume column, persisted as a
//! one-row CSV. A chosen column is later read back as an alert threshold,
//! scaled from per-candle to per-second volume.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::collector::{OrderBook, Ticker24h};
use crate::error::{Result, VolbotError};

/// Default threshold column for order-book alerts
pub const DEFAULT_THRESHOLD_COLUMN: &str = "D10";

/// Quartiles and deciles of a volume series
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeStats {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    /// Maximum
    pub q4: f64,
    /// D1..D10
    pub deciles: [f64; 10],
}

impl VolumeStats {
    /// `None` for an empty series
    pub fn compute(volumes: &[f64]) -> Option<Self> {
        if volumes.is_empty() {
            return None;
        }
        let mut sorted = volumes.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mut deciles = [0.0; 10];
        for (i, d) in deciles.iter_mut().enumerate() {
            *d = quantile_sorted(&sorted, (i + 1) as f64 / 10.0);
        }

        Some(Self {
            q1: quantile_sorted(&sorted, 0.25),
            q2: quantile_sorted(&sorted, 0.50),
            q3: quantile_sorted(&sorted, 0.75),
            q4: sorted[sorted.len() - 1],
            deciles,
        })
    }

    /// `(column, value)` pairs in file order
    pub fn columns(&self) -> Vec<(String, f64)> {
        let mut columns = vec![
            ("Q1".to_string(), self.q1),
            ("Q2".to_string(), self.q2),
            ("Q3".to_string(), self.q3),
            ("Q4".to_string(), self.q4),
        ];
        for (i, d) in self.deciles.iter().enumerate() {
            columns.push((format!("D{}", i + 1), *d));
        }
        columns
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let columns = self.columns();
        let header: Vec<&str> = columns.iter().map(|(name, _)| name.as_str()).collect();
        let values: Vec<String> = columns.iter().map(|(_, v)| v.to_string()).collect();
        fs::write(path, format!("{}\n{}\n", header.join(","), values.join(",")))?;

        info!("Saved volume statistics to {}", path.display());
        Ok(())
    }
}

/// Linear-interpolated quantile of an ascending slice, `q` in `[0, 1]`
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Seconds in a Binance candle interval such as `5m` or `1h`
pub fn interval_seconds(interval: &str) -> Option<u64> {
    let interval = interval.trim();
    let (split, _) = interval.char_indices().last()?;
    let (count, unit) = interval.split_at(split);
    let count: u64 = count.parse().ok()?;
    let unit_secs = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        "w" => 604_800,
        _ => return None,
    };
    Some(count * unit_secs)
}

/// Read `column` from a stats file and scale it to volume per second
pub fn load_threshold(path: &Path, column: &str, interval: &str) -> Result<f64> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path)?;
    let mut lines = content.lines();
    let (Some(header), Some(values)) = (lines.next(), lines.next()) else {
        return Err(VolbotError::Dataset {
            path: shown,
            line: 1,
            reason: "statistics file needs a header and a value row".to_string(),
        });
    };

    let idx = header
        .split(',')
        .position(|name| name.trim().eq_ignore_ascii_case(column))
        .ok_or_else(|| VolbotError::Dataset {
            path: shown.clone(),
            line: 1,
            reason: format!("column {column:?} not found"),
        })?;

    let raw = values.split(',').nth(idx).unwrap_or("").trim();
    let value: f64 = raw.parse().map_err(|_| VolbotError::Dataset {
        path: shown.clone(),
        line: 2,
        reason: format!("invalid {column} value {raw:?}"),
    })?;

    let divisor = interval_seconds(interval).unwrap_or(1).max(1);
    Ok(value / divisor as f64)
}

/// Which side of the book a level sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bid,
    Ask,
}

impl BookSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookSide::Bid => "BID",
            BookSide::Ask => "ASK",
        }
    }
}

/// A book level whose quantity exceeds the threshold
#[derive(Debug, Clone, PartialEq)]
pub struct HeavyLevel {
    pub side: BookSide,
    pub price: f64,
    pub quantity: f64,
}

/// Last trade larger than the threshold plus the heavy levels behind it
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeAlert {
    pub symbol: String,
    pub last_price: f64,
    pub last_qty: f64,
    pub threshold: f64,
    pub levels: Vec<HeavyLevel>,
}

impl VolumeAlert {
    pub fn message(&self) -> String {
        let mut lines = vec![
            "🚨 *VOLUME ALERT*".to_string(),
            format!("Symbol: `{}`", self.symbol),
            format!("Last price: {:.2}", self.last_price),
            format!("Last quantity: {:.5}", self.last_qty),
            format!("Threshold: {:.5}", self.threshold),
            format!("Excess: {:.5}", self.last_qty - self.threshold),
            String::new(),
            "*Heavy levels:*".to_string(),
        ];
        for level in &self.levels {
            lines.push(format!(
                "[{}] Price: {:.2} Vol: {:.5}",
                level.side.as_str(),
                level.price,
                level.quantity
            ));
        }
        lines.join("\n")
    }
}

/// Alert when the last traded quantity and at least one of the top `depth`
/// levels both exceed `threshold`
pub fn check_volume_alert(
    ticker: &Ticker24h,
    book: &OrderBook,
    depth: usize,
    threshold: f64,
) -> Option<VolumeAlert> {
    let last_qty = ticker.last_qty.unwrap_or(0.0);
    if last_qty <= threshold {
        return None;
    }

    let sides = [(BookSide::Bid, &book.bids), (BookSide::Ask, &book.asks)];
    let levels: Vec<HeavyLevel> = sides
        .into_iter()
        .flat_map(|(side, levels)| {
            levels
                .iter()
                .take(depth)
                .filter(move |l| l.quantity > threshold)
                .map(move |l| HeavyLevel {
                    side,
                    price: l.price,
                    quantity: l.quantity,
                })
        })
        .collect();

    if levels.is_empty() {
        return None;
    }
    Some(VolumeAlert {
        symbol: ticker.symbol.clone(),
        last_price: ticker.last_price.unwrap_or(0.0),
        last_qty,
        threshold,
        levels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::BookLevel;

    #[test]
    fn test_quantiles_match_linear_interpolation() {
        let stats = VolumeStats::compute(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.q2, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.q4, 4.0);
        assert_eq!(stats.deciles[9], 4.0);
        assert!((stats.deciles[0] - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty_series_has_no_stats() {
        assert!(VolumeStats::compute(&[]).is_none());
    }

    #[test]
    fn test_interval_seconds() {
        assert_eq!(interval_seconds("1m"), Some(60));
        assert_eq!(interval_seconds("5m"), Some(300));
        assert_eq!(interval_seconds("15m"), Some(900));
        assert_eq!(interval_seconds("1h"), Some(3600));
        assert_eq!(interval_seconds("1d"), Some(86_400));
        assert_eq!(interval_seconds("m"), None);
        assert_eq!(interval_seconds(""), None);
    }

    #[test]
    fn test_interval_with_multibyte_unit_is_rejected() {
        assert_eq!(interval_seconds("5é"), None);
        assert_eq!(interval_seconds("é"), None);
        assert_eq!(interval_seconds("5m\u{00e9}"), None);
    }

    #[test]
    fn test_save_then_load_threshold() {
        let dir = std::env::temp_dir().join(format!("volbot-stats-{}", uuid::Uuid::new_v4()));
        let path = dir.join("BTCUSDT_5m_stat.csv");
        let volumes: Vec<f64> = (1..=10).map(|v| v as f64 * 30.0).collect();

        let stats = VolumeStats::compute(&volumes).unwrap();
        stats.save(&path).unwrap();

        let header = fs::read_to_string(&path).unwrap();
        assert!(header.starts_with("Q1,Q2,Q3,Q4,D1,"));

        // D10 is the max, 300 per 5 minutes
        assert_eq!(load_threshold(&path, "D10", "5m").unwrap(), 1.0);
        assert_eq!(load_threshold(&path, "q4", "1m").unwrap(), 5.0);
        assert!(matches!(
            load_threshold(&path, "D11", "5m"),
            Err(VolbotError::Dataset { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    fn book() -> OrderBook {
        OrderBook {
            last_update_id: 7,
            bids: vec![
                BookLevel {
                    price: 99.0,
                    quantity: 0.5,
                },
                BookLevel {
                    price: 98.0,
                    quantity: 3.0,
                },
            ],
            asks: vec![BookLevel {
                price: 101.0,
                quantity: 2.5,
            }],
        }
    }

    fn ticker(last_qty: f64) -> Ticker24h {
        Ticker24h {
            symbol: "BTCUSDT".to_string(),
            last_price: Some(100.0),
            last_qty: Some(last_qty),
            bid_price: None,
            ask_price: None,
            volume: None,
        }
    }

    #[test]
    fn test_alert_requires_large_last_trade() {
        assert!(check_volume_alert(&ticker(0.9), &book(), 5, 1.0).is_none());

        let alert = check_volume_alert(&ticker(1.5), &book(), 5, 1.0).unwrap();
        assert_eq!(alert.levels.len(), 2);
        assert_eq!(alert.levels[0].side, BookSide::Bid);
        assert_eq!(alert.levels[0].price, 98.0);
        assert_eq!(alert.levels[1].side, BookSide::Ask);
        assert!(alert.message().contains("[ASK] Price: 101.00 Vol: 2.50000"));
    }

    #[test]
    fn test_alert_respects_depth() {
        assert!(check_volume_alert(&ticker(1.5), &book(), 1, 3.0).is_none());
        let alert = check_volume_alert(&ticker(1.5), &book(), 1, 1.0).unwrap();
        assert_eq!(alert.levels.len(), 1);
        assert_eq!(alert.levels[0].side, BookSide::Ask);
    }
}
