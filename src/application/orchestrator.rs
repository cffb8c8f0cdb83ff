//! Trading Orchestrator
//!
//! Runs the discovery cycle: fetch trending, pick the top N, screen, buy,
//! and hand every filled buy to its own `PositionMonitor` task.
//! Between cycles it sleeps; `stop()` wakes it and every monitor.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::monitor::{MonitorSettings, PositionMonitor};
use super::registry::{OpenPositions, PositionClaim};
use super::shutdown::sleep_or_shutdown;
use crate::config::Config;
use crate::domain::{ExitThresholds, Position, RiskScreener, ScreeningConfig, TokenCandidate};
use crate::ports::{MarketFeed, RelayOutcome, TradeRelay, RELAY_REJECTED};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Orchestrator is already running")]
    AlreadyRunning,
    #[error("Orchestrator was stopped")]
    Stopped,
}

/// Everything the cycle and its monitors need, resolved from config
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub trade_amount: f64,
    pub slippage_pct: f64,
    pub top_n: usize,
    pub buy_spacing: Duration,
    pub cycle_interval: Duration,
    pub empty_feed_backoff: Duration,
    pub screening: ScreeningConfig,
    pub exits: ExitThresholds,
    pub monitor: MonitorSettings,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            trade_amount: 5.0,
            slippage_pct: 2.0,
            top_n: 3,
            buy_spacing: Duration::from_secs(10),
            cycle_interval: Duration::from_secs(1800),
            empty_feed_backoff: Duration::from_secs(1800),
            screening: ScreeningConfig::default(),
            exits: ExitThresholds::from_percent(10.0, 50.0),
            monitor: MonitorSettings::default(),
        }
    }
}

impl From<&Config> for OrchestratorSettings {
    fn from(config: &Config) -> Self {
        Self {
            trade_amount: config.trading.trade_amount,
            slippage_pct: config.trading.slippage_pct,
            top_n: config.trading.top_n,
            buy_spacing: Duration::from_secs(config.trading.buy_spacing_secs),
            cycle_interval: Duration::from_secs(config.trading.cycle_interval_secs),
            empty_feed_backoff: Duration::from_secs(config.trading.empty_feed_backoff_secs),
            screening: config.screening_config(),
            exits: config.exit_thresholds(),
            monitor: MonitorSettings {
                poll_interval: config.poll_interval(),
                max_feed_failures: config.exits.max_feed_failures,
            },
        }
    }
}

impl OrchestratorSettings {
    fn validate(&self) -> Result<(), OrchestratorError> {
        if !(self.trade_amount > 0.0 && self.trade_amount.is_finite()) {
            return Err(OrchestratorError::InvalidSettings(format!(
                "trade_amount must be > 0, got {}",
                self.trade_amount
            )));
        }
        if !(self.slippage_pct > 0.0 && self.slippage_pct <= 100.0) {
            return Err(OrchestratorError::InvalidSettings(format!(
                "slippage_pct must be 0-100, got {}",
                self.slippage_pct
            )));
        }
        if self.top_n == 0 {
            return Err(OrchestratorError::InvalidSettings("top_n must be > 0".to_string()));
        }
        let ExitThresholds {
            stop_loss_pct,
            take_profit_pct,
        } = self.exits;
        if !(stop_loss_pct > 0.0 && stop_loss_pct < 1.0)
            || !(take_profit_pct > 0.0 && take_profit_pct.is_finite())
        {
            return Err(OrchestratorError::InvalidSettings(format!(
                "exit thresholds out of range: stop_loss={}, take_profit={}",
                stop_loss_pct, take_profit_pct
            )));
        }
        if self.monitor.max_feed_failures == 0 {
            return Err(OrchestratorError::InvalidSettings(
                "max_feed_failures must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Candidates returned by the feed
    pub fetched: usize,
    /// Distinct candidates taken from the top of the list
    pub considered: usize,
    /// Skipped because a position on the pair is already open
    pub skipped_open: usize,
    /// Rejected by the risk screener
    pub screened_out: usize,
    /// Skipped because no usable entry price could be found
    pub unpriced: usize,
    pub buys_accepted: usize,
    pub buys_rejected: usize,
    /// Positions opened and handed to a monitor
    pub opened: usize,
    /// The trending fetch failed or came back empty
    pub feed_empty: bool,
}

/// Main orchestrator. Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct TradingOrchestrator {
    feed: Arc<dyn MarketFeed>,
    relay: Arc<dyn TradeRelay>,
    screener: RiskScreener,
    settings: OrchestratorSettings,
    open_positions: OpenPositions,
    shutdown: Arc<watch::Sender<bool>>,
    monitors: Arc<Mutex<JoinSet<Position>>>,
    is_running: Arc<RwLock<bool>>,
}

impl TradingOrchestrator {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        relay: Arc<dyn TradeRelay>,
        settings: OrchestratorSettings,
    ) -> Result<Self, OrchestratorError> {
        settings.validate()?;
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            feed,
            relay,
            screener: RiskScreener::new(settings.screening.clone()),
            settings,
            open_positions: OpenPositions::new(),
            shutdown: Arc::new(shutdown),
            monitors: Arc::new(Mutex::new(JoinSet::new())),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Pairs with an open position, sorted
    pub fn open_positions(&self) -> Vec<String> {
        self.open_positions.snapshot()
    }

    pub fn is_stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Request shutdown. The cycle loop and every monitor observe it at
    /// their next wait point.
    pub async fn stop(&self) {
        info!("Stopping orchestrator...");
        self.shutdown.send_replace(true);
    }

    /// Run cycles until `stop()`, then wait for every monitor to exit.
    pub async fn run(&self) -> Result<(), OrchestratorError> {
        if self.is_stopping() {
            return Err(OrchestratorError::Stopped);
        }
        {
            let mut running = self.is_running.write().await;
            if *running {
                return Err(OrchestratorError::AlreadyRunning);
            }
            *running = true;
        }

        info!(
            top_n = self.settings.top_n,
            trade_amount = self.settings.trade_amount,
            cycle_secs = self.settings.cycle_interval.as_secs(),
            "Trading loop started"
        );

        let mut shutdown = self.shutdown.subscribe();
        let mut cycle: u64 = 0;

        while !self.is_stopping() {
            cycle += 1;
            let report = self.run_cycle().await;
            self.reap_finished().await;

            let pause = if report.feed_empty {
                warn!(
                    cycle,
                    "No trending tokens; backing off for {:?}", self.settings.empty_feed_backoff
                );
                self.settings.empty_feed_backoff
            } else {
                info!(
                    cycle,
                    considered = report.considered,
                    opened = report.opened,
                    open_positions = self.open_positions.len(),
                    "Cycle complete; next scan in {:?}",
                    self.settings.cycle_interval
                );
                self.settings.cycle_interval
            };

            if sleep_or_shutdown(pause, &mut shutdown).await {
                break;
            }
        }

        let positions = self.join_monitors().await;
        let left_open = positions.iter().filter(|p| p.is_open()).count();
        if left_open > 0 {
            warn!(left_open, "Positions left OPEN at shutdown");
        }

        *self.is_running.write().await = false;
        info!("Trading loop stopped");
        Ok(())
    }

    /// One discovery cycle. Feed and relay failures are logged and counted,
    /// never returned.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let candidates = match self.feed.fetch_trending().await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error_kind = e.kind(), "Trending fetch failed: {}", e);
                report.feed_empty = true;
                return report;
            }
        };
        report.fetched = candidates.len();
        if candidates.is_empty() {
            report.feed_empty = true;
            return report;
        }

        let selected = select_top(candidates, self.settings.top_n);
        report.considered = selected.len();

        let mut shutdown = self.shutdown.subscribe();
        let mut submitted = false;

        for candidate in selected {
            if self.is_stopping() {
                break;
            }
            let pair = candidate.pair_address.as_str();

            if self.open_positions.contains(pair) {
                debug!(pair = %pair, "Position already open, skipping");
                report.skipped_open += 1;
                continue;
            }

            let screening = self.screener.screen(&candidate);
            if !screening.accepted {
                info!(
                    pair = %pair,
                    symbol = %candidate.symbol,
                    score = screening.score,
                    failed = %screening.failed_summary(),
                    "Screened out"
                );
                report.screened_out += 1;
                continue;
            }

            // Held until the monitor ends, or dropped on any skip below
            let Some(claim) = self.open_positions.try_claim(pair) else {
                report.skipped_open += 1;
                continue;
            };

            let Some(entry_price) = self.resolve_entry_price(&candidate).await else {
                report.unpriced += 1;
                continue;
            };

            if submitted && sleep_or_shutdown(self.settings.buy_spacing, &mut shutdown).await {
                break;
            }

            // Position first: every accepted buy goes straight to a monitor
            let position = match Position::open(
                pair,
                &candidate.symbol,
                entry_price,
                self.settings.exits,
            ) {
                Ok(position) => position,
                Err(e) => {
                    error!(
                        pair = %pair,
                        error_kind = e.kind(),
                        "Position not opened, buy skipped: {}", e
                    );
                    report.unpriced += 1;
                    continue;
                }
            };
            submitted = true;

            info!(
                pair = %pair,
                symbol = %candidate.symbol,
                score = screening.score,
                amount = self.settings.trade_amount,
                "Buying"
            );
            match self
                .relay
                .submit_buy(pair, self.settings.trade_amount, self.settings.slippage_pct)
                .await
            {
                RelayOutcome::Accepted => {
                    report.buys_accepted += 1;
                    self.spawn_monitor(position, claim).await;
                    report.opened += 1;
                }
                RelayOutcome::Rejected(reason) => {
                    warn!(pair = %pair, error_kind = RELAY_REJECTED, "Buy rejected: {}", reason);
                    report.buys_rejected += 1;
                }
            }
        }

        report
    }

    /// Candidate price when usable, else one price lookup
    async fn resolve_entry_price(&self, candidate: &TokenCandidate) -> Option<f64> {
        if let Some(price) = candidate.entry_price() {
            return Some(price);
        }
        match self.feed.fetch_price(&candidate.pair_address).await {
            Ok(price) if price.is_finite() && price > 0.0 => Some(price),
            Ok(price) => {
                warn!(pair = %candidate.pair_address, price, "Unusable entry price, skipping");
                None
            }
            Err(e) => {
                warn!(
                    pair = %candidate.pair_address,
                    error_kind = e.kind(),
                    "No entry price, skipping: {}", e
                );
                None
            }
        }
    }

    /// The claim travels with the monitor and is released when it exits
    async fn spawn_monitor(&self, position: Position, claim: PositionClaim) {
        let monitor = PositionMonitor::new(
            position,
            self.feed.clone(),
            self.relay.clone(),
            self.settings.monitor,
        );
        let shutdown = self.shutdown.subscribe();

        self.monitors.lock().await.spawn(async move {
            let _claim = claim;
            monitor.run(shutdown).await
        });
    }

    /// Collect monitors that already exited, without waiting
    pub async fn reap_finished(&self) -> Vec<Position> {
        let mut monitors = self.monitors.lock().await;
        let mut closed = Vec::new();
        while let Some(joined) = monitors.try_join_next() {
            if let Some(position) = log_monitor_exit(joined) {
                closed.push(position);
            }
        }
        closed
    }

    /// Wait for every monitor to exit and return their final positions
    pub async fn join_monitors(&self) -> Vec<Position> {
        let mut monitors = self.monitors.lock().await;
        let mut positions = Vec::new();
        while let Some(joined) = monitors.join_next().await {
            if let Some(position) = log_monitor_exit(joined) {
                positions.push(position);
            }
        }
        positions
    }
}

fn log_monitor_exit(joined: Result<Position, tokio::task::JoinError>) -> Option<Position> {
    match joined {
        Ok(position) => {
            info!(
                pair = %position.pair_address,
                status = position.status.as_str(),
                exit_price = ?position.exit_price,
                "Monitor finished"
            );
            Some(position)
        }
        Err(e) => {
            error!("Monitor task failed: {}", e);
            None
        }
    }
}

/// First `top_n` distinct pairs, in feed order
fn select_top(candidates: Vec<TokenCandidate>, top_n: usize) -> Vec<TokenCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.pair_address.clone()))
        .take(top_n)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::execution::MockTradeRelay;
    use crate::ports::market_data::MockMarketFeed;
    use crate::ports::FeedError;

    fn good(pair: &str) -> TokenCandidate {
        TokenCandidate::new(pair, "GOOD")
            .with_liquidity(50_000.0)
            .with_holders(5_000)
            .with_price(1.0)
    }

    fn settings() -> OrchestratorSettings {
        OrchestratorSettings {
            buy_spacing: Duration::ZERO,
            ..OrchestratorSettings::default()
        }
    }

    fn orchestrator(feed: MockMarketFeed, relay: MockTradeRelay) -> TradingOrchestrator {
        TradingOrchestrator::new(Arc::new(feed), Arc::new(relay), settings()).unwrap()
    }

    #[test]
    fn test_select_top_dedupes_in_feed_order() {
        let picked = select_top(
            vec![good("A"), good("B"), good("A"), good("C"), good("D")],
            3,
        );
        let pairs: Vec<_> = picked.iter().map(|c| c.pair_address.as_str()).collect();
        assert_eq!(pairs, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_settings_validation() {
        let feed = Arc::new(MockMarketFeed::new());
        let relay = Arc::new(MockTradeRelay::new());

        let bad = OrchestratorSettings {
            top_n: 0,
            ..OrchestratorSettings::default()
        };
        assert!(matches!(
            TradingOrchestrator::new(feed.clone(), relay.clone(), bad),
            Err(OrchestratorError::InvalidSettings(_))
        ));

        let bad = OrchestratorSettings {
            exits: ExitThresholds::from_percent(100.0, 50.0),
            ..OrchestratorSettings::default()
        };
        assert!(TradingOrchestrator::new(feed, relay, bad).is_err());
    }

    #[test]
    fn test_nan_settings_rejected() {
        let feed: Arc<dyn MarketFeed> = Arc::new(MockMarketFeed::new());
        let relay: Arc<dyn TradeRelay> = Arc::new(MockTradeRelay::new());

        let nan_settings = [
            OrchestratorSettings {
                exits: ExitThresholds::from_percent(f64::NAN, 50.0),
                ..OrchestratorSettings::default()
            },
            OrchestratorSettings {
                exits: ExitThresholds::from_percent(10.0, f64::NAN),
                ..OrchestratorSettings::default()
            },
            OrchestratorSettings {
                slippage_pct: f64::NAN,
                ..OrchestratorSettings::default()
            },
            OrchestratorSettings {
                trade_amount: f64::NAN,
                ..OrchestratorSettings::default()
            },
        ];
        for bad in nan_settings {
            assert!(matches!(
                TradingOrchestrator::new(feed.clone(), relay.clone(), bad),
                Err(OrchestratorError::InvalidSettings(_))
            ));
        }
    }

    #[test]
    fn test_settings_from_config() {
        let settings = OrchestratorSettings::from(&Config::default());
        assert_eq!(settings.top_n, 3);
        assert_eq!(settings.buy_spacing, Duration::from_secs(10));
        assert_eq!(settings.empty_feed_backoff, Duration::from_secs(1800));
        assert_eq!(settings.monitor.poll_interval, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_failed_feed_buys_nothing() {
        let mut feed = MockMarketFeed::new();
        feed.expect_fetch_trending()
            .times(1)
            .returning(|| Err(FeedError::Status(500)));
        let mut relay = MockTradeRelay::new();
        relay.expect_submit_buy().times(0);

        let report = orchestrator(feed, relay).run_cycle().await;
        assert!(report.feed_empty);
        assert_eq!(report.buys_accepted + report.buys_rejected, 0);
    }

    #[tokio::test]
    async fn test_empty_feed_buys_nothing() {
        let mut feed = MockMarketFeed::new();
        feed.expect_fetch_trending().times(1).returning(|| Ok(vec![]));
        let mut relay = MockTradeRelay::new();
        relay.expect_submit_buy().times(0);

        let report = orchestrator(feed, relay).run_cycle().await;
        assert!(report.feed_empty);
        assert_eq!(report.fetched, 0);
    }

    #[tokio::test]
    async fn test_screened_out_candidate_not_bought() {
        let mut feed = MockMarketFeed::new();
        feed.expect_fetch_trending()
            .returning(|| Ok(vec![TokenCandidate::new("RUG", "RUGPULL").with_price(1.0)]));
        let mut relay = MockTradeRelay::new();
        relay.expect_submit_buy().times(0);

        let orch = orchestrator(feed, relay);
        let report = orch.run_cycle().await;
        assert_eq!(report.screened_out, 1);
        assert!(orch.open_positions().is_empty());
    }

    #[tokio::test]
    async fn test_unpriced_candidate_skipped() {
        let mut feed = MockMarketFeed::new();
        feed.expect_fetch_trending()
            .returning(|| Ok(vec![good("A").with_price(0.0)]));
        feed.expect_fetch_price()
            .times(1)
            .returning(|pair| Err(FeedError::NoPrice(pair.to_string())));
        let mut relay = MockTradeRelay::new();
        relay.expect_submit_buy().times(0);

        let orch = orchestrator(feed, relay);
        let report = orch.run_cycle().await;
        assert_eq!(report.unpriced, 1);
        assert!(orch.open_positions().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_buy_releases_claim() {
        let mut feed = MockMarketFeed::new();
        feed.expect_fetch_trending().returning(|| Ok(vec![good("A")]));
        let mut relay = MockTradeRelay::new();
        relay
            .expect_submit_buy()
            .times(1)
            .returning(|_, _, _| RelayOutcome::Rejected("insufficient balance".into()));

        let orch = orchestrator(feed, relay);
        let report = orch.run_cycle().await;
        assert_eq!(report.buys_rejected, 1);
        assert_eq!(report.opened, 0);
        assert!(orch.open_positions().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_buy_opens_monitored_position() {
        let mut feed = MockMarketFeed::new();
        feed.expect_fetch_trending().returning(|| Ok(vec![good("A")]));
        let mut relay = MockTradeRelay::new();
        relay
            .expect_submit_buy()
            .times(1)
            .returning(|_, _, _| RelayOutcome::Accepted);

        let orch = orchestrator(feed, relay);
        let report = orch.run_cycle().await;
        assert_eq!(report.buys_accepted, 1);
        assert_eq!(report.opened, 1);
        assert_eq!(orch.open_positions(), vec!["A"]);

        // Monitor sleeps before its first poll, so it exits on shutdown with the position OPEN
        orch.stop().await;
        let positions = orch.join_monitors().await;
        assert_eq!(positions.len(), 1);
        assert!(positions[0].is_open());
        assert!(orch.open_positions().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_orchestrator_will_not_run() {
        let orch = orchestrator(MockMarketFeed::new(), MockTradeRelay::new());
        orch.stop().await;
        assert!(orch.is_stopping());
        assert!(matches!(orch.run().await, Err(OrchestratorError::Stopped)));
    }
}
