//! Historical Replay Training
//!
//! Drives the agent over a finite sequence of historical rows. A sequence of
//! N rows gives N-1 steps: step `t` acts at the price of row `t`, observes
//! the next state from row `t + 1`, and is terminal when `t + 1` is the last
//! row. The account is reset at the start of every episode.

use tracing::{debug, info, warn};

use crate::coordination::Shutdown;
use crate::error::{Result, VolbotError};
use crate::persistence::{local_timestamp, save_trades, SymbolPaths};
use crate::rl::algorithms::QLearningAgent;
use crate::rl::core::{Action, Observation};
use crate::rl::environment::{FillContext, TradeSide, TradingAccount, Transition};

/// Result of one pass over the sequence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeStats {
    /// Zero-based episode index
    pub episode: usize,
    pub steps: usize,
    pub total_reward: f64,
    /// Executed fills (BUY and SELL)
    pub trades: usize,
    /// Completed BUY -> SELL pairs
    pub round_trips: usize,
    pub final_balance: f64,
    pub final_position: f64,
    /// Balance plus position value at the last price
    pub final_equity: f64,
    /// Exploration rate after the episode
    pub epsilon: f64,
    /// States in the Q-table after the episode
    pub table_size: usize,
    /// Stopped early by a shutdown request
    pub interrupted: bool,
}

impl EpisodeStats {
    fn new(episode: usize) -> Self {
        Self {
            episode,
            ..Default::default()
        }
    }

    fn record(&mut self, transition: &Transition) {
        self.steps += 1;
        self.total_reward += transition.reward;
        if let Some(trade) = &transition.trade {
            self.trades += 1;
            if trade.side == TradeSide::Sell {
                self.round_trips += 1;
            }
        }
    }
}

/// All episodes of one replay run
#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    pub episodes: Vec<EpisodeStats>,
    /// Whether a shutdown request ended the run early
    pub cancelled: bool,
}

impl ReplayReport {
    pub fn total_reward(&self) -> f64 {
        self.episodes.iter().map(|e| e.total_reward).sum()
    }

    pub fn best_episode(&self) -> Option<&EpisodeStats> {
        self.episodes
            .iter()
            .filter(|e| !e.interrupted)
            .max_by(|a, b| a.total_reward.total_cmp(&b.total_reward))
    }
}

/// Replays historical rows through the agent and the account
pub struct ReplayDriver {
    agent: QLearningAgent,
    account: TradingAccount,
    paths: SymbolPaths,
    shutdown: Option<Shutdown>,
}

impl ReplayDriver {
    pub fn new(agent: QLearningAgent, account: TradingAccount, paths: SymbolPaths) -> Self {
        Self {
            agent,
            account,
            paths,
            shutdown: None,
        }
    }

    /// Stop between steps once `shutdown` is requested
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Run `episodes` passes over `observations`, then save the Q-table.
    ///
    /// The trade log is replaced after every completed episode. A shutdown
    /// request ends the run early; the Q-table is still saved.
    pub fn run(&mut self, observations: &[Observation], episodes: usize) -> Result<ReplayReport> {
        if observations.len() < 2 {
            return Err(VolbotError::Validation(format!(
                "replay needs at least 2 rows, got {}",
                observations.len()
            )));
        }

        info!(
            "Starting replay for {}: {} episodes over {} rows",
            self.paths.symbol,
            episodes,
            observations.len()
        );

        let mut report = ReplayReport::default();
        for episode in 0..episodes {
            let stats = self.run_episode(episode, observations);

            if stats.interrupted {
                warn!(
                    "Replay interrupted during episode {}/{} after {} steps",
                    episode + 1,
                    episodes,
                    stats.steps
                );
                report.episodes.push(stats);
                report.cancelled = true;
                break;
            }

            save_trades(&self.paths.trade_log, self.account.trades())?;

            info!(
                "Episode {}/{}: reward={:.2}, trades={}, round_trips={}, balance={:.2}, position={:.5}, equity={:.2}, eps={:.3}, states={}",
                episode + 1,
                episodes,
                stats.total_reward,
                stats.trades,
                stats.round_trips,
                stats.final_balance,
                stats.final_position,
                stats.final_equity,
                stats.epsilon,
                stats.table_size
            );
            report.episodes.push(stats);
        }

        self.agent.save_to(&self.paths.q_table)?;
        Ok(report)
    }

    /// One pass over the rows starting from a freshly reset account
    pub fn run_episode(&mut self, episode: usize, observations: &[Observation]) -> EpisodeStats {
        self.account.reset();
        let mut stats = EpisodeStats::new(episode);
        let last = observations.len().saturating_sub(1);

        for t in 0..last {
            if self.cancelled() {
                stats.interrupted = true;
                break;
            }

            let row = &observations[t];
            let next_row = &observations[t + 1];
            let terminal = t + 1 == last;

            let state = self.account.state(row.volume, row.price);
            let action = self.agent.choose_action(&state);
            let fill = FillContext {
                step: t as u64,
                timestamp: row.timestamp.clone().unwrap_or_else(local_timestamp),
            };
            let transition = self.account.apply(action, row.price, fill);
            let next_state = self.account.state(next_row.volume, next_row.price);
            self.agent
                .learn(&state, action, transition.reward, &next_state, terminal);

            if action != Action::Hold {
                debug!(
                    "step {} {} @ {:.2} executed={} reward={:.2}",
                    t,
                    action,
                    row.price,
                    transition.executed(),
                    transition.reward
                );
            }
            stats.record(&transition);
        }

        let last_price = observations.get(last).map(|o| o.price).unwrap_or(0.0);
        stats.final_balance = self.account.balance();
        stats.final_position = self.account.position();
        stats.final_equity = self.account.equity(last_price);
        stats.epsilon = self.agent.epsilon();
        stats.table_size = self.agent.table().len();
        stats
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn account(&self) -> &TradingAccount {
        &self.account
    }

    pub fn paths(&self) -> &SymbolPaths {
        &self.paths
    }

    fn cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|s| s.is_requested())
    }
}
