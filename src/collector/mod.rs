//! Market data collection
//!
//! Binance public REST access for live polling and historical K-lines, and
//! the CSV datasets built from them.

pub mod binance_rest;
pub mod dataset;

pub use binance_rest::{
    live_observation, BinanceClient, BinanceLiveFeed, BookLevel, Kline, OrderBook, Ticker24h,
    BINANCE_API_URL, KLINES_PAGE_LIMIT,
};
pub use dataset::{load_dataset, merge_into, merge_rows, write_dataset, DATASET_HEADER};
