//! RL Algorithms
//!
//! Implementations of reinforcement learning algorithms.

pub mod q_learning;

pub use q_learning::QLearningAgent;
