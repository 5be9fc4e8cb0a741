use std::path::PathBuf;

use volbot::collector::{load_dataset, write_dataset};
use volbot::persistence::{load_trades, SymbolPaths};
use volbot::rl::{
    Observation, QLearningAgent, QLearningConfig, QTable, ReplayDriver, StateCodec, StateVector,
    TradeSide, TradingAccount,
};

const BALANCE: f64 = 10_000.0;
const FEE: f64 = 0.001;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("volbot-it-{}", uuid::Uuid::new_v4()))
}

/// Agent that prefers BUY on the first row and SELL on the second.
fn buy_then_sell_agent() -> QLearningAgent {
    let position = BALANCE / 100.0 * (1.0 - FEE);
    let mut table = QTable::new();
    table.insert(
        StateCodec::encode(&StateVector::new(1.0, 100.0, 0.0, BALANCE)),
        [0.0, 1.0, 0.0],
    );
    table.insert(
        StateCodec::encode(&StateVector::new(1.0, 105.0, position, 0.0)),
        [0.0, 0.0, 1.0],
    );
    QLearningAgent::with_table(QLearningConfig::greedy(), table)
}

/// Three rows, one greedy episode: exactly one round trip whose reward is
/// the fee-adjusted sale proceeds minus the starting balance.
#[test]
fn three_row_episode_completes_one_round_trip() {
    let dir = scratch_dir();
    let paths = SymbolPaths::resolve(&dir, &dir, "BTCUSDT", "5m");

    write_dataset(
        &paths.dataset,
        &[
            Observation::new(1.0, 100.0).with_timestamp("2024-01-01 00:00:00"),
            Observation::new(1.0, 105.0).with_timestamp("2024-01-01 00:05:00"),
            Observation::new(1.0, 95.0).with_timestamp("2024-01-01 00:10:00"),
        ],
    )
    .unwrap();
    let rows = load_dataset(&paths.dataset).unwrap();

    let mut driver = ReplayDriver::new(
        buy_then_sell_agent(),
        TradingAccount::new(BALANCE, FEE),
        paths.clone(),
    );
    let report = driver.run(&rows, 1).unwrap();

    let expected = BALANCE * (105.0 / 100.0) * (1.0 - FEE) * (1.0 - FEE) - BALANCE;
    let episode = &report.episodes[0];
    assert_eq!(episode.steps, 2);
    assert_eq!(episode.round_trips, 1);
    assert!(
        (episode.total_reward - expected).abs() < 1e-6,
        "reward {} != {}",
        episode.total_reward,
        expected
    );
    assert_eq!(episode.final_position, 0.0);

    let trades = load_trades(&paths.trade_log).unwrap();
    let sides: Vec<TradeSide> = trades.iter().map(|t| t.side).collect();
    assert_eq!(sides, vec![TradeSide::Buy, TradeSide::Sell]);
    assert_eq!(trades[1].timestamp, "2024-01-01 00:05:00");

    // the saved table reloads with the same rows
    let saved = QTable::load(&paths.q_table).unwrap().unwrap();
    assert_eq!(&saved, driver.agent().table());

    let _ = std::fs::remove_dir_all(&dir);
}

/// A corrupt dataset fails before anything is written.
#[test]
fn malformed_dataset_persists_nothing() {
    let dir = scratch_dir();
    let paths = SymbolPaths::resolve(&dir, &dir, "BTCUSDT", "5m");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(&paths.dataset, "Timestamp,Volume,Price\nt0,1,100\nt1,1,oops\n").unwrap();

    assert!(load_dataset(&paths.dataset).is_err());
    assert!(!paths.q_table.exists());
    assert!(!paths.trade_log.exists());

    let _ = std::fs::remove_dir_all(&dir);
}
