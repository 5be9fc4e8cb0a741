//! Action Space
//!
//! The three discrete actions the agent can take.

use serde::{Deserialize, Serialize};

/// Number of discrete actions
pub const NUM_ACTIONS: usize = 3;

/// Discrete trading action, integer-coded as 0/1/2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    /// Do nothing
    Hold = 0,
    /// Commit the whole balance to the base asset
    Buy = 1,
    /// Liquidate the whole position
    Sell = 2,
}

impl Action {
    /// Convert from action index
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Hold),
            1 => Some(Self::Buy),
            2 => Some(Self::Sell),
            _ => None,
        }
    }

    /// Convert to action index
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Get all possible actions
    pub fn all() -> &'static [Action] {
        &[Self::Hold, Self::Buy, Self::Sell]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hold => "HOLD",
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::Hold
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_index_roundtrip() {
        for action in Action::all() {
            let recovered = Action::from_index(action.to_index()).unwrap();
            assert_eq!(*action, recovered);
        }
        assert_eq!(Action::from_index(3), None);
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(Action::Hold.to_index(), 0);
        assert_eq!(Action::Buy.to_index(), 1);
        assert_eq!(Action::Sell.to_index(), 2);
        assert_eq!(Action::Sell.to_string(), "SELL");
    }
}
