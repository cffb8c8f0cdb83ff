//! Paper relay: logs each command and reports it accepted without sending.

use async_trait::async_trait;
use tracing::info;

use super::command::render_command;
use crate::domain::TradeIntent;
use crate::ports::{RelayOutcome, TradeRelay};

#[derive(Debug, Clone)]
pub struct PaperRelay {
    base_currency: String,
}

impl PaperRelay {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into(),
        }
    }
}

impl Default for PaperRelay {
    fn default() -> Self {
        Self::new("SOL")
    }
}

#[async_trait]
impl TradeRelay for PaperRelay {
    async fn submit(&self, intent: &TradeIntent) -> RelayOutcome {
        let command = render_command(intent, &self.base_currency);
        info!(pair = %intent.pair_address, action = %intent.action, "[PAPER] {}", command);
        RelayOutcome::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quantity;

    #[tokio::test]
    async fn test_paper_relay_accepts_everything() {
        let relay = PaperRelay::default();
        assert!(relay.submit_buy("PairA", 5.0, 2.0).await.is_accepted());
        assert!(relay.submit_sell("PairA", Quantity::All).await.is_accepted());
    }
}
