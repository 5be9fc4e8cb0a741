//! Live Trading Loop
//!
//! Polls a market feed, lets the agent act on a simulated account, and keeps
//! learning online with `terminal = false`. Every tick is appended to the
//! decision log; executed fills are pushed to the alert sink. The loop runs
//! until shutdown is requested, then writes a timestamped Q-table snapshot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::coordination::Shutdown;
use crate::error::{Result, VolbotError};
use crate::persistence::{local_timestamp, save_trades, DecisionLog, DecisionRecord, SymbolPaths};
use crate::rl::algorithms::QLearningAgent;
use crate::rl::core::Action;
use crate::rl::environment::{FillContext, TradingAccount, Transition};

/// One live market sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveObservation {
    /// Last traded quantity
    pub volume: f64,
    /// Last traded price
    pub price: f64,
    pub best_bid: f64,
    pub best_ask: f64,
}

impl LiveObservation {
    pub fn spread(&self) -> f64 {
        self.best_ask - self.best_bid
    }
}

/// Source of live observations
#[async_trait]
pub trait LiveFeed: Send + Sync {
    /// Fetch the latest observation; every failure is retried by the caller
    async fn poll(&self) -> Result<LiveObservation>;
}

/// One-way notification channel. Implementations log delivery failures
/// themselves and never return them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Loop timing
#[derive(Debug, Clone, Copy)]
pub struct LiveSettings {
    /// Wait between two ticks, also the retry delay after a failed poll
    pub poll_interval: Duration,
    /// Save the Q-table to its default path every N ticks (0 disables)
    pub checkpoint_every: u64,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            checkpoint_every: 100,
        }
    }
}

/// What a live session did before it was stopped
#[derive(Debug, Clone, Default)]
pub struct LiveSummary {
    pub ticks: u64,
    pub failed_polls: u64,
    pub trades: usize,
    pub alerts_sent: u64,
    pub total_reward: f64,
    pub final_balance: f64,
    pub final_position: f64,
    /// Where the interrupt snapshot was written
    pub snapshot: Option<PathBuf>,
}

/// Online agent driven by a live feed
pub struct LiveDriver {
    agent: QLearningAgent,
    account: TradingAccount,
    paths: SymbolPaths,
    feed: Arc<dyn LiveFeed>,
    alerts: Arc<dyn AlertSink>,
    decisions: DecisionLog,
    settings: LiveSettings,
    shutdown: Shutdown,
    summary: LiveSummary,
}

impl LiveDriver {
    /// Build a driver; opens (or creates) the decision log
    pub fn new(
        agent: QLearningAgent,
        account: TradingAccount,
        paths: SymbolPaths,
        feed: Arc<dyn LiveFeed>,
        alerts: Arc<dyn AlertSink>,
        settings: LiveSettings,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let decisions = DecisionLog::open(&paths.decision_log)?;
        Ok(Self {
            agent,
            account,
            paths,
            feed,
            alerts,
            decisions,
            settings,
            shutdown,
            summary: LiveSummary::default(),
        })
    }

    /// Run until shutdown is requested, then snapshot the Q-table
    pub async fn run(&mut self) -> Result<LiveSummary> {
        info!(
            "Starting live agent for {} (poll every {:?}, balance {:.2})",
            self.paths.symbol,
            self.settings.poll_interval,
            self.account.balance()
        );

        while !self.shutdown.is_requested() {
            if let Err(e) = self.tick().await {
                self.summary.failed_polls += 1;
                if e.is_transient() {
                    warn!(
                        "Market data unavailable: {}. Retrying in {:?}",
                        e, self.settings.poll_interval
                    );
                } else {
                    error!(
                        "Live feed failed: {}. Retrying in {:?}",
                        e, self.settings.poll_interval
                    );
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                _ = self.shutdown.wait() => {}
            }
        }

        info!("Live agent for {} interrupted, saving progress", self.paths.symbol);
        self.save_snapshot();
        if let Err(e) = save_trades(&self.paths.live_trade_log, self.account.trades()) {
            error!(
                "Failed to save live trade log {:?}: {}",
                self.paths.live_trade_log, e
            );
        }

        self.summary.trades = self.account.trades().len();
        self.summary.final_balance = self.account.balance();
        self.summary.final_position = self.account.position();
        info!(
            "Live session ended: ticks={}, failed_polls={}, trades={}, reward={:.2}, balance={:.2}, position={:.5}",
            self.summary.ticks,
            self.summary.failed_polls,
            self.summary.trades,
            self.summary.total_reward,
            self.summary.final_balance,
            self.summary.final_position
        );
        Ok(self.summary.clone())
    }

    /// Poll once and act on the observation
    pub async fn tick(&mut self) -> Result<Transition> {
        let obs = self.feed.poll().await?;
        if !(obs.price > 0.0 && obs.price.is_finite()) {
            return Err(VolbotError::InvalidMarketData(format!(
                "price {} for {}",
                obs.price, self.paths.symbol
            )));
        }

        let state = self.account.state(obs.volume, obs.price);
        let action = self.agent.choose_action(&state);
        let timestamp = local_timestamp();
        let fill = FillContext {
            step: self.summary.ticks,
            timestamp: timestamp.clone(),
        };
        let transition = self.account.apply(action, obs.price, fill);
        let next_state = self.account.state(obs.volume, obs.price);
        self.agent
            .learn(&state, action, transition.reward, &next_state, false);

        self.summary.ticks += 1;
        self.summary.total_reward += transition.reward;

        let record = DecisionRecord {
            timestamp,
            symbol: self.paths.symbol.clone(),
            action,
            price: obs.price,
            volume: obs.volume,
            best_bid: obs.best_bid,
            best_ask: obs.best_ask,
            spread: obs.spread(),
            position: self.account.position(),
            balance: self.account.balance(),
            reward: transition.reward,
        };
        if let Err(e) = self.decisions.append(&record) {
            error!("Failed to append decision log {:?}: {}", self.decisions.path(), e);
        }

        debug!(
            "tick {} {} @ {:.2} executed={} eps={:.4}",
            self.summary.ticks,
            action,
            obs.price,
            transition.executed(),
            self.agent.epsilon()
        );

        if transition.executed() {
            let message = self.alert_message(action, &obs, transition.reward);
            self.alerts.notify(&message).await;
            self.summary.alerts_sent += 1;
        }

        let every = self.settings.checkpoint_every;
        if every > 0 && self.summary.ticks % every == 0 {
            if let Err(e) = self.agent.save_to(&self.paths.q_table) {
                error!("Periodic Q-table checkpoint failed: {}", e);
            }
        }

        Ok(transition)
    }

    fn alert_message(&self, action: Action, obs: &LiveObservation, reward: f64) -> String {
        let position = self.account.position();
        let balance = self.account.balance();
        let value = self.account.position_value(obs.price);
        format!(
            "🚨 *VOLBOT AGENT*\n\
             Symbol: `{}`\n\
             Action: {}\n\
             Price: {:.2} | Volume: {:.5}\n\
             Position value: {:.2}\n\
             Position: {:.5} | Balance: {:.2}\n\
             Balance + position: {:.2}\n\
             Reward: {:.2}",
            self.paths.symbol,
            action,
            obs.price,
            obs.volume,
            value,
            position,
            balance,
            balance + value,
            reward
        )
    }

    fn save_snapshot(&mut self) {
        let path = self.paths.snapshot_now();
        match self.agent.save_to(&path) {
            Ok(()) => self.summary.snapshot = Some(path),
            Err(e) => error!("Failed to save Q-table snapshot {:?}: {}", path, e),
        }
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn account(&self) -> &TradingAccount {
        &self.account
    }

    pub fn summary(&self) -> &LiveSummary {
        &self.summary
    }
}
