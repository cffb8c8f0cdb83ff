use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

/// How much to trade: an amount of the base currency, or the whole holding
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Quantity {
    Base(f64),
    All,
}

/// Outbound command for the trading relay. Built right before sending and dropped after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeIntent {
    pub action: TradeAction,
    pub pair_address: String,
    pub quantity: Quantity,
    /// Slippage tolerance in percent, buys only
    pub slippage_pct: Option<f64>,
}

impl TradeIntent {
    pub fn buy(pair_address: impl Into<String>, amount: f64, slippage_pct: f64) -> Self {
        Self {
            action: TradeAction::Buy,
            pair_address: pair_address.into(),
            quantity: Quantity::Base(amount),
            slippage_pct: Some(slippage_pct),
        }
    }

    pub fn sell(pair_address: impl Into<String>, quantity: Quantity) -> Self {
        Self {
            action: TradeAction::Sell,
            pair_address: pair_address.into(),
            quantity,
            slippage_pct: None,
        }
    }
}
