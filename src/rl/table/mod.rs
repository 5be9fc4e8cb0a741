//! Tabular value storage
//!
//! The Q-table and the decoders that read its historical on-disk layouts.

pub mod key_codec;
pub mod q_table;

pub use key_codec::{
    decode_key, default_decoders, encode_key, BracketListDecoder, KeyDecoder, PlainTupleDecoder,
    TypeTaggedTupleDecoder,
};
pub use q_table::{QRow, QTable};
