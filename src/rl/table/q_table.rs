//! Q-table storage
//!
//! Maps quantized states to one value per action and persists the mapping
//! as a JSON object `{ "<key>": [q_hold, q_buy, q_sell], ... }`.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tracing::{debug, error, info};

use super::key_codec::{decode_key, default_decoders, encode_key, KeyDecoder};
use crate::error::{Result, VolbotError};
use crate::rl::core::{StateKey, NUM_ACTIONS};

/// Action values for one state, indexed by `Action::to_index`
pub type QRow = [f64; NUM_ACTIONS];

/// Tabular action-value store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    rows: HashMap<StateKey, QRow>,
}

impl QTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Read-only lookup, no initialization
    pub fn get(&self, key: &StateKey) -> Option<&QRow> {
        self.rows.get(key)
    }

    /// Row for `key`, created as all zeros on first access
    pub fn row_mut(&mut self, key: StateKey) -> &mut QRow {
        self.rows.entry(key).or_insert([0.0; NUM_ACTIONS])
    }

    /// Copy of the row for `key`, created as all zeros on first access
    pub fn row(&mut self, key: StateKey) -> QRow {
        *self.row_mut(key)
    }

    pub fn insert(&mut self, key: StateKey, row: QRow) {
        self.rows.insert(key, row);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &QRow)> {
        self.rows.iter()
    }

    /// Serialize to the canonical JSON text
    pub fn to_json(&self) -> Result<String> {
        let ordered: BTreeMap<&StateKey, &QRow> = self.rows.iter().collect();
        let mut object = serde_json::Map::with_capacity(ordered.len());
        for (key, row) in ordered {
            object.insert(encode_key(key), serde_json::to_value(row)?);
        }
        Ok(serde_json::to_string(&serde_json::Value::Object(object))?)
    }

    /// Parse JSON text using the default key decoders
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_json_with(text, &default_decoders())
    }

    /// Parse JSON text trying `decoders` in order for every key
    pub fn from_json_with(text: &str, decoders: &[Box<dyn KeyDecoder>]) -> Result<Self> {
        let raw: HashMap<String, Vec<f64>> = serde_json::from_str(text)?;
        let mut rows = HashMap::with_capacity(raw.len());

        for (raw_key, values) in raw {
            let key = decode_key(&raw_key, decoders)?;
            let row: QRow = values.as_slice().try_into().map_err(|_| {
                VolbotError::QTableFormat(format!(
                    "row for {raw_key:?} has {} values, expected {NUM_ACTIONS}",
                    values.len()
                ))
            })?;
            rows.insert(key, row);
        }

        Ok(Self { rows })
    }

    /// Write the table, replacing any previous file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, self.to_json()?)?;
        fs::rename(&tmp, path)?;

        debug!("Saved Q-table with {} states to {:?}", self.len(), path);
        Ok(())
    }

    /// Read a table; `Ok(None)` when the file does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)?;
        Self::from_json(&text).map(Some)
    }

    /// Read a table, falling back to an empty one on any failure
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(Some(table)) => {
                info!("Loaded Q-table with {} states from {:?}", table.len(), path);
                table
            }
            Ok(None) => {
                info!("No Q-table at {:?}, starting empty", path);
                Self::new()
            }
            Err(e) => {
                error!("Failed to load Q-table {:?}: {}. Starting empty", path, e);
                Self::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("volbot-qtable-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    fn key(values: [f64; 4]) -> StateKey {
        StateKey::from_values(&values).unwrap()
    }

    #[test]
    fn test_lazy_row_is_zero() {
        let mut table = QTable::new();
        let k = key([1.0, 100.0, 0.0, 1000.0]);

        assert!(table.get(&k).is_none());
        assert_eq!(table.row(k), [0.0, 0.0, 0.0]);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let path = temp_path("BTCUSDT_q_table.json");
        let mut table = QTable::new();
        table.insert(key([1.0, 100.0, 0.0, 1000.0]), [0.1, -2.5, 3.25]);
        table.insert(key([0.5, 101.37, 9.99, 0.0]), [0.0, 0.0, 12.5]);

        table.save(&path).unwrap();
        let loaded = QTable::load(&path).unwrap().unwrap();

        assert_eq!(loaded, table);
        assert!(!path.with_extension("json.tmp").exists());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let path = temp_path("missing.json");
        assert!(QTable::load(&path).unwrap().is_none());
        assert!(QTable::load_or_empty(&path).is_empty());
    }

    #[test]
    fn test_load_type_tagged_file() {
        let text = r#"{"(np.float32(1.0), np.float32(100.0), np.float32(0.0), np.float32(1000.0))": [0.5, 1.5, -0.25]}"#;
        let table = QTable::from_json(text).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&key([1.0, 100.0, 0.0, 1000.0])),
            Some(&[0.5, 1.5, -0.25])
        );
    }

    #[test]
    fn test_corrupt_file_falls_back_to_empty() {
        let path = temp_path("corrupt.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, "{not json").unwrap();
        assert!(QTable::load(&path).is_err());
        assert!(QTable::load_or_empty(&path).is_empty());

        fs::write(&path, r#"{"(1.0, 2.0, 3.0, 4.0)": [1.0, 2.0]}"#).unwrap();
        assert!(matches!(
            QTable::load(&path),
            Err(VolbotError::QTableFormat(_))
        ));
        assert!(QTable::load_or_empty(&path).is_empty());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_json_keys_are_tuple_text() {
        let mut table = QTable::new();
        table.insert(key([1.5, 100.0, 0.0, 1000.0]), [1.0, 0.0, 0.0]);

        let json = table.to_json().unwrap();
        assert_eq!(json, r#"{"(1.5, 100.0, 0.0, 1000.0)":[1.0,0.0,0.0]}"#);
    }
}
