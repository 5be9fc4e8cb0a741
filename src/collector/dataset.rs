//! Historical datasets
//!
//! CSV files of `(timestamp, volume, price)` rows used for replay training
//! and volume statistics. Columns are located by header name, so files with
//! extra columns load as long as `Volume` and `Price` are present.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Result, VolbotError};
use crate::rl::core::Observation;

pub const DATASET_HEADER: &str = "Timestamp,Volume,Price";

struct Columns {
    volume: usize,
    price: usize,
    timestamp: Option<usize>,
    width: usize,
}

impl Columns {
    fn from_header(header: &str) -> Option<Self> {
        let names: Vec<String> = header
            .split(',')
            .map(|c| c.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
            .collect();
        let find = |wanted: &[&str]| names.iter().position(|n| wanted.contains(&n.as_str()));

        Some(Self {
            volume: find(&["volume"])?,
            price: find(&["price", "close"])?,
            timestamp: find(&["timestamp", "date", "time", "open_time"]),
            width: names.len(),
        })
    }
}

/// Load every row; any malformed row fails the whole load
pub fn load_dataset(path: &Path) -> Result<Vec<Observation>> {
    let shown = path.display().to_string();
    let malformed = |line: usize, reason: String| VolbotError::Dataset {
        path: shown.clone(),
        line,
        reason,
    };

    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(malformed(1, "empty file".to_string())),
    };
    let columns = Columns::from_header(&header)
        .ok_or_else(|| malformed(1, format!("header {header:?} lacks Volume/Price columns")))?;

    let mut rows = Vec::new();
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() != columns.width {
            return Err(malformed(
                line_no,
                format!("expected {} columns, found {}", columns.width, parts.len()),
            ));
        }

        let number = |idx: usize, name: &str| -> Result<f64> {
            let raw = parts[idx];
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                _ => Err(malformed(line_no, format!("invalid {name} {raw:?}"))),
            }
        };

        let mut observation = Observation::new(
            number(columns.volume, "volume")?,
            number(columns.price, "price")?,
        );
        if let Some(idx) = columns.timestamp {
            observation = observation.with_timestamp(parts[idx]);
        }
        rows.push(observation);
    }

    info!("Loaded {} rows from {}", rows.len(), shown);
    Ok(rows)
}

/// Write rows with the canonical header, replacing the file
pub fn write_dataset(path: &Path, rows: &[Observation]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", DATASET_HEADER)?;
    for row in rows {
        writeln!(
            writer,
            "{},{},{}",
            row.timestamp.as_deref().unwrap_or(""),
            row.volume,
            row.price
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// Union of two row sets keyed by timestamp, sorted ascending.
///
/// Existing rows win over fresh ones with the same timestamp. Rows without
/// a timestamp cannot be merged and are dropped.
pub fn merge_rows(existing: Vec<Observation>, fresh: Vec<Observation>) -> Vec<Observation> {
    let mut by_time: BTreeMap<String, Observation> = BTreeMap::new();
    let mut dropped = 0usize;

    for row in fresh.into_iter().chain(existing) {
        match row.timestamp.clone() {
            Some(ts) => {
                by_time.insert(ts, row);
            }
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!("Dropped {} rows without a timestamp while merging", dropped);
    }
    by_time.into_values().collect()
}

/// Merge `fresh` into the dataset at `path` and rewrite it
pub fn merge_into(path: &Path, fresh: Vec<Observation>) -> Result<usize> {
    let existing = if path.exists() {
        load_dataset(path)?
    } else {
        Vec::new()
    };
    let before = existing.len();
    let merged = merge_rows(existing, fresh);
    write_dataset(path, &merged)?;

    let added = merged.len().saturating_sub(before);
    info!(
        "Saved {} rows ({} new) to {}",
        merged.len(),
        added,
        path.display()
    );
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("volbot-dataset-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn test_load_by_header_name() {
        let path = temp_file("BTCUSDT_5m.csv");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            "Symbol,Price,Timestamp,Volume\nBTCUSDT,100.5,2024-01-01 00:00:00,1.25\n\nBTCUSDT,101,2024-01-01 00:05:00,0.5\n",
        )
        .unwrap();

        let rows = load_dataset(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, 100.5);
        assert_eq!(rows[0].volume, 1.25);
        assert_eq!(rows[1].timestamp.as_deref(), Some("2024-01-01 00:05:00"));
        cleanup(&path);
    }

    #[test]
    fn test_malformed_row_fails_whole_load() {
        let path = temp_file("bad.csv");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "Timestamp,Volume,Price\nt0,1,100\nt1,abc,101\n").unwrap();

        match load_dataset(&path) {
            Err(VolbotError::Dataset { line, reason, .. }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("volume"));
            }
            other => panic!("expected dataset error, got {other:?}"),
        }

        fs::write(&path, "Timestamp,Volume,Price\nt0,1\n").unwrap();
        assert!(matches!(
            load_dataset(&path),
            Err(VolbotError::Dataset { line: 2, .. })
        ));
        cleanup(&path);
    }

    #[test]
    fn test_missing_columns_and_missing_file() {
        let path = temp_file("nocols.csv");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "Ativo,Data,Intervalo\n").unwrap();
        assert!(matches!(
            load_dataset(&path),
            Err(VolbotError::Dataset { line: 1, .. })
        ));
        cleanup(&path);

        assert!(matches!(
            load_dataset(&temp_file("absent.csv")),
            Err(VolbotError::Io(_))
        ));
    }

    #[test]
    fn test_merge_dedupes_and_sorts() {
        let row = |ts: &str, price: f64| Observation::new(1.0, price).with_timestamp(ts);
        let existing = vec![row("2024-01-01 00:10:00", 3.0), row("2024-01-01 00:00:00", 1.0)];
        let fresh = vec![
            row("2024-01-01 00:05:00", 2.0),
            row("2024-01-01 00:10:00", 99.0),
            Observation::new(1.0, 5.0),
        ];

        let merged = merge_rows(existing, fresh);
        let prices: Vec<f64> = merged.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_merge_into_rewrites_file() {
        let path = temp_file("ETHUSDT_1h.csv");
        let first = vec![Observation::new(2.0, 3000.0).with_timestamp("2024-01-01 01:00:00")];
        assert_eq!(merge_into(&path, first).unwrap(), 1);

        let second = vec![
            Observation::new(1.0, 2990.0).with_timestamp("2024-01-01 00:00:00"),
            Observation::new(2.0, 3000.0).with_timestamp("2024-01-01 01:00:00"),
        ];
        assert_eq!(merge_into(&path, second).unwrap(), 1);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Timestamp,Volume,Price\n2024-01-01 00:00:00,1,2990\n2024-01-01 01:00:00,2,3000\n"
        );
        cleanup(&path);
    }
}
