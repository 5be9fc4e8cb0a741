//! State Representation
//!
//! The agent observes a 4-feature vector `(volume, price, position, balance)`.
//! Continuous vectors are quantized to two decimals before they are used as
//! Q-table keys, so vectors that agree to the cent share one table row.

use serde::{Deserialize, Serialize};

/// Number of features in the state vector
pub const STATE_DIM: usize = 4;

/// Decimal places kept by the quantizer
pub const KEY_DECIMALS: i32 = 2;

const KEY_SCALE: f64 = 100.0;

/// One historical sample: traded volume and price at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub volume: f64,
    pub price: f64,
    /// Source timestamp, if the dataset carries one
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl Observation {
    pub fn new(volume: f64, price: f64) -> Self {
        Self {
            volume,
            price,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Raw continuous state seen by the agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub volume: f64,
    pub price: f64,
    pub position: f64,
    pub balance: f64,
}

impl StateVector {
    pub fn new(volume: f64, price: f64, position: f64, balance: f64) -> Self {
        Self {
            volume,
            price,
            position,
            balance,
        }
    }

    pub fn to_array(&self) -> [f64; STATE_DIM] {
        [self.volume, self.price, self.position, self.balance]
    }

    pub fn from_array(values: [f64; STATE_DIM]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

/// Quantized, hashable state used as a Q-table key.
///
/// Stored as integer hundredths so equality and hashing are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateKey([i64; STATE_DIM]);

impl StateKey {
    /// Quantize arbitrary floats; `None` unless exactly `STATE_DIM` values are given
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let values: &[f64; STATE_DIM] = values.try_into().ok()?;
        Some(Self::quantized(values))
    }

    fn quantized(values: &[f64; STATE_DIM]) -> Self {
        let mut units = [0i64; STATE_DIM];
        for (slot, value) in units.iter_mut().zip(values) {
            *slot = quantize(*value);
        }
        Self(units)
    }

    /// Values the key stands for, already rounded
    pub fn values(&self) -> [f64; STATE_DIM] {
        let mut values = [0.0; STATE_DIM];
        for (value, units) in values.iter_mut().zip(self.0.iter()) {
            *value = *units as f64 / KEY_SCALE;
        }
        values
    }
}

/// Tuple-of-floats text form, e.g. `(1.5, 100.0, 0.0, 1000.0)`
impl std::fmt::Display for StateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.values().iter().map(|v| format!("{:?}", v)).collect();
        write!(f, "({})", parts.join(", "))
    }
}

fn quantize(value: f64) -> i64 {
    // `as` saturates and maps NaN to 0
    (value * KEY_SCALE).round() as i64
}

/// Maps continuous state vectors onto discrete table keys
#[derive(Debug, Clone, Copy, Default)]
pub struct StateCodec;

impl StateCodec {
    pub fn encode(state: &StateVector) -> StateKey {
        StateKey::quantized(&state.to_array())
    }

    /// Vector at the center of the key's cell
    pub fn decode(key: &StateKey) -> StateVector {
        StateVector::from_array(key.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_to_two_decimals_share_key() {
        let a = StateVector::new(1.234, 100.001, 0.0, 1000.0);
        let b = StateVector::new(1.226, 99.998, 0.0, 1000.004);
        assert_eq!(StateCodec::encode(&a), StateCodec::encode(&b));

        let c = StateVector::new(1.24, 100.0, 0.0, 1000.0);
        assert_ne!(StateCodec::encode(&a), StateCodec::encode(&c));
    }

    #[test]
    fn test_encode_is_idempotent() {
        let samples = [
            StateVector::new(0.0123, 104_512.987, 0.0, 10_000.0),
            StateVector::new(3.5, 0.015, 0.096_523, 0.0),
            StateVector::new(-0.004, 1.0, 2.0, 3.0),
        ];
        for state in samples {
            let key = StateCodec::encode(&state);
            let again = StateCodec::encode(&StateCodec::decode(&key));
            assert_eq!(key, again);
        }
    }

    #[test]
    fn test_codec_and_raw_values_agree() {
        let state = StateVector::new(1.236, 99.994, 0.006, 1000.0);
        let from_values = StateKey::from_values(&state.to_array()).unwrap();
        assert_eq!(StateCodec::encode(&state), from_values);
        assert_eq!(from_values.values(), [1.24, 99.99, 0.01, 1000.0]);
    }

    #[test]
    fn test_display_tuple_form() {
        let key = StateCodec::encode(&StateVector::new(1.5, 100.0, 0.0, 1000.0));
        assert_eq!(key.to_string(), "(1.5, 100.0, 0.0, 1000.0)");
    }

    #[test]
    fn test_from_values_requires_four() {
        assert!(StateKey::from_values(&[1.0, 2.0, 3.0]).is_none());
        assert!(StateKey::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_none());
        let key = StateKey::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(key.values(), [1.0, 2.0, 3.0, 4.0]);
    }
}
