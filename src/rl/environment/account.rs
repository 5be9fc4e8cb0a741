//! Trading Account State Machine
//!
//! An all-in, single-position account with exactly two economic states:
//! flat (all capital in quote currency) and long (all capital in the base
//! asset). BUY is only possible while flat and SELL only while long; any
//! other combination is a no-op. Fees are charged on both fills.
//!
//! The reward is sparse: zero except on SELL, where it is the balance after
//! the sale minus the baseline balance the account was last reset to.

use serde::{Deserialize, Serialize};

use crate::rl::core::{Action, StateVector};

/// Economic state of the account
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Holding {
    /// Holding quote currency only
    Flat { balance: f64 },
    /// Holding base asset only
    Long { position: f64, entry_price: f64 },
}

/// Side of an executed fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}

/// One executed fill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Step index within the episode or session
    pub step: u64,
    /// Source timestamp of the observation that triggered the fill
    pub timestamp: String,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub price: f64,
    /// Base-asset quantity bought or sold
    pub volume: f64,
    /// Quote balance after the fill
    pub balance: f64,
    /// Realized profit against the baseline (SELL only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit: Option<f64>,
}

/// Where a fill happened, stamped onto its trade record
#[derive(Debug, Clone)]
pub struct FillContext {
    pub step: u64,
    pub timestamp: String,
}

/// Outcome of applying one action
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub action: Action,
    pub reward: f64,
    /// The fill, if the action changed the account
    pub trade: Option<TradeRecord>,
}

impl Transition {
    /// Whether the action changed the account (BUY or SELL executed)
    pub fn executed(&self) -> bool {
        self.trade.is_some()
    }
}

/// Simulated trading account
#[derive(Debug, Clone)]
pub struct TradingAccount {
    holding: Holding,
    /// Balance at the last reset, the reference for SELL rewards
    baseline: f64,
    fee_rate: f64,
    trades: Vec<TradeRecord>,
}

impl TradingAccount {
    /// Create a flat account holding `initial_balance`
    pub fn new(initial_balance: f64, fee_rate: f64) -> Self {
        Self {
            holding: Holding::Flat {
                balance: initial_balance,
            },
            baseline: initial_balance,
            fee_rate,
            trades: Vec::new(),
        }
    }

    /// Return to flat at the baseline balance and clear the trade ledger
    pub fn reset(&mut self) {
        self.holding = Holding::Flat {
            balance: self.baseline,
        };
        self.trades.clear();
    }

    /// Apply `action` at `price`
    pub fn apply(&mut self, action: Action, price: f64, fill: FillContext) -> Transition {
        let tradable = price > 0.0 && price.is_finite();
        let trade = match (action, self.holding) {
            (Action::Buy, Holding::Flat { balance }) if tradable && balance > 0.0 => {
                let position = (balance / price) * (1.0 - self.fee_rate);
                self.holding = Holding::Long {
                    position,
                    entry_price: price,
                };
                Some(TradeRecord {
                    step: fill.step,
                    timestamp: fill.timestamp,
                    side: TradeSide::Buy,
                    price,
                    volume: position,
                    balance: 0.0,
                    profit: None,
                })
            }
            (Action::Sell, Holding::Long { position, .. }) if tradable => {
                let balance = position * price * (1.0 - self.fee_rate);
                self.holding = Holding::Flat { balance };
                Some(TradeRecord {
                    step: fill.step,
                    timestamp: fill.timestamp,
                    side: TradeSide::Sell,
                    price,
                    volume: position,
                    balance,
                    profit: Some(balance - self.baseline),
                })
            }
            // HOLD, BUY while long, SELL while flat, or no usable price
            _ => None,
        };

        let reward = trade.as_ref().and_then(|t| t.profit).unwrap_or(0.0);
        if let Some(record) = &trade {
            self.trades.push(record.clone());
        }

        Transition {
            action,
            reward,
            trade,
        }
    }

    /// State vector for the agent given the latest observation
    pub fn state(&self, volume: f64, price: f64) -> StateVector {
        StateVector::new(volume, price, self.position(), self.balance())
    }

    pub fn holding(&self) -> Holding {
        self.holding
    }

    pub fn balance(&self) -> f64 {
        match self.holding {
            Holding::Flat { balance } => balance,
            Holding::Long { .. } => 0.0,
        }
    }

    pub fn position(&self) -> f64 {
        match self.holding {
            Holding::Flat { .. } => 0.0,
            Holding::Long { position, .. } => position,
        }
    }

    pub fn entry_price(&self) -> f64 {
        match self.holding {
            Holding::Flat { .. } => 0.0,
            Holding::Long { entry_price, .. } => entry_price,
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self.holding, Holding::Long { .. })
    }

    /// Mark-to-market value of the position at `price`
    pub fn position_value(&self, price: f64) -> f64 {
        self.position() * price
    }

    /// Balance plus position value at `price`
    pub fn equity(&self, price: f64) -> f64 {
        self.balance() + self.position_value(price)
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn fee_rate(&self) -> f64 {
        self.fee_rate
    }

    /// Fills since the last reset, oldest first
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }
}
