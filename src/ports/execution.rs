use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Quantity, TradeIntent};

/// Log tag for relay rejections
pub const RELAY_REJECTED: &str = "RelayRejected";

/// What the relay did with one command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayOutcome {
    Accepted,
    Rejected(String),
}

impl RelayOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RelayOutcome::Accepted)
    }
}

/// Trading relay port.
///
/// Sends are at-most-once: a failed send comes back as `Rejected` and is
/// never retried here. Callers decide what a rejection means.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TradeRelay: Send + Sync {
    async fn submit(&self, intent: &TradeIntent) -> RelayOutcome;

    async fn submit_buy(&self, pair_address: &str, amount: f64, slippage_pct: f64) -> RelayOutcome {
        self.submit(&TradeIntent::buy(pair_address, amount, slippage_pct)).await
    }

    async fn submit_sell(&self, pair_address: &str, quantity: Quantity) -> RelayOutcome {
        self.submit(&TradeIntent::sell(pair_address, quantity)).await
    }
}
