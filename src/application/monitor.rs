//! Position Monitor
//!
//! One monitor per open position. It polls the feed on a fixed interval
//! and drives the position through exactly one exit:
//!
//! ```text
//! OPEN ──price <= stop_loss──────► CLOSED_STOP_LOSS   (SELL ALL)
//!   │ ──price >= take_profit─────► CLOSED_TAKE_PROFIT (SELL ALL)
//!   └ ──N consecutive feed errors► CLOSED_ERROR       (no sell)
//! ```
//!
//! Polls for one position never overlap. Shutdown is observed between
//! polls; a position interrupted that way stays OPEN.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::shutdown::sleep_or_shutdown;
use crate::domain::{Position, PositionStatus, Quantity};
use crate::ports::{MarketFeed, RelayOutcome, TradeRelay, RELAY_REJECTED};

/// Default poll interval per position
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Default consecutive feed failures before giving up
pub const DEFAULT_MAX_FEED_FAILURES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub max_feed_failures: u32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_feed_failures: DEFAULT_MAX_FEED_FAILURES,
        }
    }
}

pub struct PositionMonitor {
    position: Position,
    feed: Arc<dyn MarketFeed>,
    relay: Arc<dyn TradeRelay>,
    settings: MonitorSettings,
    consecutive_failures: u32,
}

impl PositionMonitor {
    pub fn new(
        position: Position,
        feed: Arc<dyn MarketFeed>,
        relay: Arc<dyn TradeRelay>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            position,
            feed,
            relay,
            settings,
            consecutive_failures: 0,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// One price check. No-op once the position is closed.
    pub async fn poll_once(&mut self) -> PositionStatus {
        if !self.position.is_open() {
            return self.position.status;
        }
        let pair = self.position.pair_address.clone();

        let price = match self.feed.fetch_price(&pair).await {
            Ok(price) => {
                self.consecutive_failures = 0;
                price
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    pair = %pair,
                    error_kind = e.kind(),
                    failures = self.consecutive_failures,
                    "Price poll failed: {}", e
                );
                if self.consecutive_failures >= self.settings.max_feed_failures {
                    self.close(PositionStatus::ClosedError, None);
                    error!(
                        pair = %pair,
                        error_kind = e.kind(),
                        "Position abandoned after {} failed polls, no sell sent; \
                         reconcile manually",
                        self.consecutive_failures
                    );
                }
                return self.position.status;
            }
        };

        let Some(trigger) = self.position.evaluate(price) else {
            debug!(
                pair = %pair,
                price,
                pnl_pct = self.position.pnl_pct(price),
                "Holding"
            );
            return self.position.status;
        };

        let status = trigger.closing_status();
        info!(
            pair = %pair,
            price,
            entry = self.position.entry_price,
            pnl_pct = self.position.pnl_pct(price),
            "{} hit, selling all",
            status.as_str()
        );

        if let RelayOutcome::Rejected(reason) = self.relay.submit_sell(&pair, Quantity::All).await {
            error!(
                pair = %pair,
                error_kind = RELAY_REJECTED,
                "Sell rejected ({}); position closed as {} anyway, reconcile manually",
                reason,
                status.as_str()
            );
        }
        self.close(status, Some(price));
        self.position.status
    }

    fn close(&mut self, status: PositionStatus, exit_price: Option<f64>) {
        if let Err(e) = self.position.close(status, exit_price) {
            warn!(pair = %self.position.pair_address, "Close ignored: {}", e);
        }
    }

    /// Poll until the position closes or shutdown is requested.
    /// Returns the position in its final state.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Position {
        info!(
            pair = %self.position.pair_address,
            entry = self.position.entry_price,
            stop_loss = self.position.stop_loss_price,
            take_profit = self.position.take_profit_price,
            "Monitoring position"
        );

        while self.position.is_open() {
            if sleep_or_shutdown(self.settings.poll_interval, &mut shutdown).await {
                warn!(
                    pair = %self.position.pair_address,
                    entry = self.position.entry_price,
                    "Shutdown with position still OPEN; reconcile manually"
                );
                break;
            }
            self.poll_once().await;
        }

        self.position
    }
}
