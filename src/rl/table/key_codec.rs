//! Q-table key decoding
//!
//! Keys are written as a tuple of floats, `(1.5, 100.0, 0.0, 1000.0)`.
//! Older files wrapped every number in a numeric type tag, e.g.
//! `(np.float32(1.5), np.float32(100.0), ...)`, and some tools emit a
//! bracketed list. Each layout has its own decoder; decoders are tried in
//! order until one accepts the key.

use crate::error::{Result, VolbotError};
use crate::rl::core::StateKey;

/// A single on-disk key layout
pub trait KeyDecoder: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Parse the raw key into its numbers, or `None` if the layout does not match
    fn decode(&self, raw: &str) -> Option<Vec<f64>>;
}

/// `(1.5, 100.0, 0.0, 1000.0)`
#[derive(Debug, Default)]
pub struct PlainTupleDecoder;

impl KeyDecoder for PlainTupleDecoder {
    fn name(&self) -> &'static str {
        "plain_tuple"
    }

    fn decode(&self, raw: &str) -> Option<Vec<f64>> {
        let inner = delimited(raw, '(', ')')?;
        split_numbers(inner, |part| part.parse::<f64>().ok())
    }
}

/// `(np.float32(1.5), np.float32(100.0), ...)` or any `tag(value)` wrapper
#[derive(Debug, Default)]
pub struct TypeTaggedTupleDecoder;

impl KeyDecoder for TypeTaggedTupleDecoder {
    fn name(&self) -> &'static str {
        "type_tagged_tuple"
    }

    fn decode(&self, raw: &str) -> Option<Vec<f64>> {
        let inner = delimited(raw, '(', ')')?;
        split_numbers(inner, |part| strip_type_tag(part).parse::<f64>().ok())
    }
}

/// `[1.5, 100.0, 0.0, 1000.0]`
#[derive(Debug, Default)]
pub struct BracketListDecoder;

impl KeyDecoder for BracketListDecoder {
    fn name(&self) -> &'static str {
        "bracket_list"
    }

    fn decode(&self, raw: &str) -> Option<Vec<f64>> {
        let inner = delimited(raw, '[', ']')?;
        split_numbers(inner, |part| part.parse::<f64>().ok())
    }
}

/// Decoders in the order they are tried
pub fn default_decoders() -> Vec<Box<dyn KeyDecoder>> {
    vec![
        Box::new(PlainTupleDecoder),
        Box::new(TypeTaggedTupleDecoder),
        Box::new(BracketListDecoder),
    ]
}

/// Decode a raw key with the first decoder that accepts it
pub fn decode_key(raw: &str, decoders: &[Box<dyn KeyDecoder>]) -> Result<StateKey> {
    for decoder in decoders {
        if let Some(values) = decoder.decode(raw) {
            return StateKey::from_values(&values).ok_or_else(|| {
                VolbotError::QTableFormat(format!(
                    "key {raw:?} decoded by {} has {} values",
                    decoder.name(),
                    values.len()
                ))
            });
        }
    }
    Err(VolbotError::QTableFormat(format!(
        "no decoder accepts key {raw:?}"
    )))
}

/// Canonical text form written by `QTable::save`
pub fn encode_key(key: &StateKey) -> String {
    key.to_string()
}

fn delimited(raw: &str, open: char, close: char) -> Option<&str> {
    raw.trim().strip_prefix(open)?.strip_suffix(close)
}

fn split_numbers<F>(inner: &str, parse: F) -> Option<Vec<f64>>
where
    F: Fn(&str) -> Option<f64>,
{
    let mut values = Vec::new();
    for part in inner.split(',') {
        let part = part.trim();
        // single-element tuples carry a trailing comma
        if part.is_empty() {
            continue;
        }
        values.push(parse(part)?);
    }
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn strip_type_tag(part: &str) -> &str {
    let Some(open) = part.find('(') else {
        return part;
    };
    let tag = &part[..open];
    let is_tag = !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    match (is_tag, part.strip_suffix(')')) {
        (true, Some(rest)) => rest[open + 1..].trim(),
        _ => part,
    }
}
