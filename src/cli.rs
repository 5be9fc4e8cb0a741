use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};

use crate::analysis::{interval_seconds, DEFAULT_THRESHOLD_COLUMN};

/// Shortest pause between two order-book watch polls
pub const MIN_WATCH_SECS: u64 = 5;

#[derive(Parser, Debug)]
#[command(name = "volbot")]
#[command(version)]
#[command(about = "Volume/price Q-learning agent for Binance spot markets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml, $VOLBOT_ENV.toml)
    #[arg(short, long, default_value = "config", global = true)]
    pub config: String,

    /// Trading pair, e.g. BTCUSDT
    #[arg(short, long, default_value = "BTCUSDT", global = true, value_parser = parse_symbol)]
    pub symbol: String,

    /// Candle interval of the dataset, e.g. 5m or 1h
    #[arg(short, long, default_value = "5m", global = true, value_parser = parse_interval)]
    pub interval: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Download historical K-lines into the symbol's dataset
    Fetch {
        /// First day to fetch (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Day after the last one to fetch (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
    },
    /// Compute volume quartiles and deciles of the dataset
    Stats,
    /// Train the agent by replaying the dataset
    Train {
        /// Number of passes over the dataset
        #[arg(short, long, default_value = "50")]
        episodes: usize,
    },
    /// Run the agent against live market data until Ctrl-C
    Live {
        /// Starting balance (defaults to account.live_initial_balance)
        #[arg(long)]
        balance: Option<f64>,
    },
    /// Watch the order book and alert on unusual volume
    Watch {
        /// Statistics column used as the threshold (Q1..Q4, D1..D10)
        #[arg(long, default_value = DEFAULT_THRESHOLD_COLUMN)]
        column: String,
        /// Seconds between polls (minimum 5)
        #[arg(long, default_value = "5")]
        every: u64,
        /// Order book levels to inspect
        #[arg(long, default_value = "5")]
        depth: u32,
        /// Stop at this local time (HH:MM)
        #[arg(long, value_parser = parse_hhmm)]
        until: Option<NaiveTime>,
    },
    /// Print the top of the order book once
    Book {
        /// Order book levels to show
        #[arg(long, default_value = "5")]
        depth: u32,
    },
}

fn parse_symbol(raw: &str) -> Result<String, String> {
    let symbol = raw.trim().to_ascii_uppercase();
    if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(format!("invalid symbol {raw:?}"));
    }
    Ok(symbol)
}

fn parse_interval(raw: &str) -> Result<String, String> {
    let interval = raw.trim().to_ascii_lowercase();
    if interval_seconds(&interval).is_none() {
        return Err(format!("invalid interval {raw:?} (expected e.g. 1m, 5m, 1h, 1d)"));
    }
    Ok(interval)
}

fn parse_hhmm(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| format!("invalid time {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_and_normalization() {
        let cli = Cli::try_parse_from(["volbot", "train", "-s", "ethusdt", "-i", "1H"]).unwrap();
        assert_eq!(cli.symbol, "ETHUSDT");
        assert_eq!(cli.interval, "1h");
        assert_eq!(cli.config, "config");
        assert_eq!(cli.command, Commands::Train { episodes: 50 });
    }

    #[test]
    fn test_watch_until() {
        let cli = Cli::try_parse_from(["volbot", "watch", "--until", "17:30"]).unwrap();
        match cli.command {
            Commands::Watch { column, every, until, .. } => {
                assert_eq!(column, DEFAULT_THRESHOLD_COLUMN);
                assert_eq!(every, 5);
                assert_eq!(until, NaiveTime::from_hms_opt(17, 30, 0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["volbot", "stats", "-s", "BTC-USDT"]).is_err());
        assert!(Cli::try_parse_from(["volbot", "stats", "-i", "5x"]).is_err());
        assert!(Cli::try_parse_from(["volbot", "stats", "-i", "5é"]).is_err());
        assert!(Cli::try_parse_from(["volbot", "fetch", "--start", "2024-13-01", "--end", "2024-01-02"]).is_err());
    }
}
