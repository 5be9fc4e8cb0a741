//! Market analysis
//!
//! Historical volume statistics and order-book volume alerts.

pub mod volume_stats;

pub use volume_stats::{
    check_volume_alert, interval_seconds, load_threshold, quantile_sorted, BookSide, HeavyLevel,
    VolumeAlert, VolumeStats, DEFAULT_THRESHOLD_COLUMN,
};
