//! Tabular Q-learning
//!
//! Epsilon-greedy action selection over a `QTable` and the one-step update
//! `Q[s][a] += alpha * (r + gamma * max Q[s'] * (1 - terminal) - Q[s][a])`.

use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::error::{Result, VolbotError};
use crate::rl::config::QLearningConfig;
use crate::rl::core::{Action, StateCodec, StateVector, NUM_ACTIONS};
use crate::rl::table::{QRow, QTable};

/// Q-learning agent owning its table and exploration schedule
pub struct QLearningAgent {
    config: QLearningConfig,
    table: QTable,
    epsilon: f64,
    rng: StdRng,
    /// Where `save` writes when no explicit path is given
    table_path: Option<PathBuf>,
    updates: u64,
}

impl QLearningAgent {
    /// Create an agent with an empty table
    pub fn new(config: QLearningConfig) -> Self {
        Self::with_table(config, QTable::new())
    }

    /// Create an agent around an existing table
    pub fn with_table(config: QLearningConfig, table: QTable) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            epsilon: config.epsilon,
            config,
            table,
            rng,
            table_path: None,
            updates: 0,
        }
    }

    /// Create an agent bound to `path`, loading the table stored there.
    ///
    /// A missing or unreadable file yields an empty table.
    pub fn load(config: QLearningConfig, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = QTable::load_or_empty(&path);
        let mut agent = Self::with_table(config, table);
        agent.table_path = Some(path);
        agent
    }

    /// Pick an action for `state`: random with probability epsilon, else greedy
    pub fn choose_action(&mut self, state: &StateVector) -> Action {
        if self.rng.gen::<f64>() < self.epsilon {
            let index = self.rng.gen_range(0..NUM_ACTIONS);
            return Action::from_index(index).unwrap_or_default();
        }
        self.greedy_action(state)
    }

    /// Best known action for `state`, first index wins ties
    pub fn greedy_action(&mut self, state: &StateVector) -> Action {
        let row = self.table.row(StateCodec::encode(state));
        Action::from_index(argmax(&row)).unwrap_or_default()
    }

    /// One-step Q-learning update followed by epsilon decay.
    ///
    /// Returns the temporal-difference error before the update.
    pub fn learn(
        &mut self,
        state: &StateVector,
        action: Action,
        reward: f64,
        next_state: &StateVector,
        terminal: bool,
    ) -> f64 {
        let key = StateCodec::encode(state);
        let next_key = StateCodec::encode(next_state);

        let next_best = max_value(&self.table.row(next_key));
        let bootstrap = if terminal { 0.0 } else { next_best };
        let target = reward + self.config.gamma * bootstrap;

        let q = &mut self.table.row_mut(key)[action.to_index()];
        let td_error = target - *q;
        *q += self.config.alpha * td_error;

        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.epsilon_min);
        self.updates += 1;

        td_error
    }

    /// Save to the path the agent was loaded from
    pub fn save(&self) -> Result<PathBuf> {
        let path = self
            .table_path
            .clone()
            .ok_or_else(|| VolbotError::Validation("agent has no Q-table path".to_string()))?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.table.save(path)?;
        info!("Saved Q-table ({} states) to {:?}", self.table.len(), path);
        Ok(())
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut QTable {
        &mut self.table
    }

    pub fn table_path(&self) -> Option<&Path> {
        self.table_path.as_deref()
    }

    /// Number of `learn` calls so far
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Q-row for `state`, initialized to zeros if unseen
    pub fn q_values(&mut self, state: &StateVector) -> QRow {
        self.table.row(StateCodec::encode(state))
    }
}

fn argmax(row: &QRow) -> usize {
    let mut best = 0;
    for (i, value) in row.iter().enumerate().skip(1) {
        if *value > row[best] {
            best = i;
        }
    }
    best
}

fn max_value(row: &QRow) -> f64 {
    row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
