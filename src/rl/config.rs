//! RL Configuration
//!
//! Hyperparameters for the tabular Q-learning agent.

use serde::{Deserialize, Serialize};

use crate::rl::core::NUM_ACTIONS;

/// Q-learning hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QLearningConfig {
    /// Starting exploration rate
    pub epsilon: f64,
    /// Exploration floor
    pub epsilon_min: f64,
    /// Multiplicative decay applied after every update
    pub epsilon_decay: f64,
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Optional RNG seed for reproducible exploration
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            epsilon: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            alpha: 0.1,
            gamma: 0.95,
            seed: None,
        }
    }
}

impl QLearningConfig {
    /// Number of actions in every Q-row
    pub fn action_count(&self) -> usize {
        NUM_ACTIONS
    }

    /// Greedy configuration (no exploration), used for evaluation and tests
    pub fn greedy() -> Self {
        Self {
            epsilon: 0.0,
            epsilon_min: 0.0,
            ..Self::default()
        }
    }

    /// Collect every out-of-range hyperparameter
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            errors.push("alpha must be in (0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            errors.push("gamma must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            errors.push("epsilon must be in [0, 1]".to_string());
        }
        if self.epsilon_min < 0.0 || self.epsilon_min > self.epsilon {
            errors.push("epsilon_min must be in [0, epsilon]".to_string());
        }
        if !(self.epsilon_decay > 0.0 && self.epsilon_decay <= 1.0) {
            errors.push("epsilon_decay must be in (0, 1]".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = QLearningConfig::default();
        assert_eq!(config.epsilon, 1.0);
        assert_eq!(config.epsilon_min, 0.01);
        assert_eq!(config.action_count(), 3);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_epsilon_min_above_epsilon_rejected() {
        let config = QLearningConfig {
            epsilon: 0.1,
            epsilon_min: 0.2,
            ..Default::default()
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("epsilon_min"));
    }
}
