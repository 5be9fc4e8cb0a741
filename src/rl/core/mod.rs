//! Core RL abstractions
//!
//! Fundamental types for actions and state quantization.

pub mod action;
pub mod state;

pub use action::{Action, NUM_ACTIONS};
pub use state::{Observation, StateCodec, StateKey, StateVector, KEY_DECIMALS, STATE_DIM};
