//! Scripted port implementations for tests.
//!
//! Both mocks record every call so tests can assert on what the
//! orchestrator and monitors actually sent.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::execution::{RelayOutcome, TradeRelay};
use super::market_data::{FeedError, MarketFeed};
use crate::domain::{TokenCandidate, TradeAction, TradeIntent};

/// Market feed that replays queued responses.
///
/// Trending fetches pop from a queue and fall back to the last batch once it
/// is drained. Price fetches pop per pair; a drained pair keeps returning its
/// last value, or `NoPrice` if it never had one.
#[derive(Debug, Default, Clone)]
pub struct ScriptedFeed {
    trending: Arc<Mutex<VecDeque<Result<Vec<TokenCandidate>, String>>>>,
    last_trending: Arc<Mutex<Option<Vec<TokenCandidate>>>>,
    prices: Arc<Mutex<HashMap<String, VecDeque<Result<f64, String>>>>>,
    last_price: Arc<Mutex<HashMap<String, f64>>>,
    trending_calls: Arc<Mutex<usize>>,
    price_calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful trending response
    pub fn with_trending(self, batch: Vec<TokenCandidate>) -> Self {
        self.trending.lock().unwrap().push_back(Ok(batch));
        self
    }

    /// Queue a failed trending response
    pub fn with_trending_failure(self, reason: &str) -> Self {
        self.trending.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    /// Queue price responses for one pair, in poll order
    pub fn with_prices(self, pair: &str, prices: &[f64]) -> Self {
        self.prices
            .lock()
            .unwrap()
            .entry(pair.to_string())
            .or_default()
            .extend(prices.iter().copied().map(Ok));
        self
    }

    /// Queue one failed price response for a pair
    pub fn with_price_failure(self, pair: &str, reason: &str) -> Self {
        self.prices
            .lock()
            .unwrap()
            .entry(pair.to_string())
            .or_default()
            .push_back(Err(reason.to_string()));
        self
    }

    pub fn trending_calls(&self) -> usize {
        *self.trending_calls.lock().unwrap()
    }

    pub fn price_calls(&self) -> Vec<String> {
        self.price_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketFeed for ScriptedFeed {
    async fn fetch_trending(&self) -> Result<Vec<TokenCandidate>, FeedError> {
        *self.trending_calls.lock().unwrap() += 1;
        let next = self.trending.lock().unwrap().pop_front();
        match next {
            Some(Ok(batch)) => {
                *self.last_trending.lock().unwrap() = Some(batch.clone());
                Ok(batch)
            }
            Some(Err(reason)) => Err(FeedError::Request(reason)),
            None => Ok(self.last_trending.lock().unwrap().clone().unwrap_or_default()),
        }
    }

    async fn fetch_price(&self, pair_address: &str) -> Result<f64, FeedError> {
        self.price_calls.lock().unwrap().push(pair_address.to_string());
        let next = self
            .prices
            .lock()
            .unwrap()
            .get_mut(pair_address)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(price)) => {
                self.last_price.lock().unwrap().insert(pair_address.to_string(), price);
                Ok(price)
            }
            Some(Err(reason)) => Err(FeedError::Request(reason)),
            None => self
                .last_price
                .lock()
                .unwrap()
                .get(pair_address)
                .copied()
                .ok_or_else(|| FeedError::NoPrice(pair_address.to_string())),
        }
    }
}

/// Relay that records intents and answers with a fixed outcome per action
#[derive(Debug, Clone)]
pub struct RecordingRelay {
    intents: Arc<Mutex<Vec<TradeIntent>>>,
    rejected_buys: Arc<Mutex<Vec<String>>>,
    reject_sells: bool,
    latency: Duration,
}

impl Default for RecordingRelay {
    fn default() -> Self {
        Self {
            intents: Arc::new(Mutex::new(Vec::new())),
            rejected_buys: Arc::new(Mutex::new(Vec::new())),
            reject_sells: false,
            latency: Duration::ZERO,
        }
    }
}

impl RecordingRelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject buys for this pair
    pub fn rejecting_buys_for(self, pair: &str) -> Self {
        self.rejected_buys.lock().unwrap().push(pair.to_string());
        self
    }

    /// Reject every sell
    pub fn rejecting_sells(mut self) -> Self {
        self.reject_sells = true;
        self
    }

    /// Sleep this long inside every submit
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn intents(&self) -> Vec<TradeIntent> {
        self.intents.lock().unwrap().clone()
    }

    pub fn count(&self, action: TradeAction, pair: &str) -> usize {
        self.intents
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.action == action && i.pair_address == pair)
            .count()
    }
}

#[async_trait]
impl TradeRelay for RecordingRelay {
    async fn submit(&self, intent: &TradeIntent) -> RelayOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.intents.lock().unwrap().push(intent.clone());

        let rejected = match intent.action {
            TradeAction::Buy => self
                .rejected_buys
                .lock()
                .unwrap()
                .contains(&intent.pair_address),
            TradeAction::Sell => self.reject_sells,
        };
        if rejected {
            RelayOutcome::Rejected(format!("scripted rejection for {}", intent.pair_address))
        } else {
            RelayOutcome::Accepted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quantity;

    #[tokio::test]
    async fn test_scripted_feed_replays_prices() {
        let feed = ScriptedFeed::new()
            .with_prices("PairA", &[1.0, 2.0])
            .with_price_failure("PairA", "boom");

        assert_eq!(feed.fetch_price("PairA").await.unwrap(), 1.0);
        assert_eq!(feed.fetch_price("PairA").await.unwrap(), 2.0);
        assert!(feed.fetch_price("PairA").await.is_err());
        // Drained: repeats the last good price
        assert_eq!(feed.fetch_price("PairA").await.unwrap(), 2.0);
        assert!(matches!(feed.fetch_price("PairB").await, Err(FeedError::NoPrice(_))));
        assert_eq!(feed.price_calls().len(), 5);
    }

    #[tokio::test]
    async fn test_scripted_feed_trending() {
        let feed = ScriptedFeed::new()
            .with_trending_failure("down")
            .with_trending(vec![TokenCandidate::new("PairA", "AAA")]);

        assert!(feed.fetch_trending().await.is_err());
        assert_eq!(feed.fetch_trending().await.unwrap().len(), 1);
        assert_eq!(feed.fetch_trending().await.unwrap().len(), 1);
        assert_eq!(feed.trending_calls(), 3);
    }

    #[tokio::test]
    async fn test_recording_relay() {
        let relay = RecordingRelay::new().rejecting_buys_for("PairB");

        assert!(relay.submit_buy("PairA", 1.0, 2.0).await.is_accepted());
        assert!(!relay.submit_buy("PairB", 1.0, 2.0).await.is_accepted());
        assert!(relay.submit_sell("PairA", Quantity::All).await.is_accepted());

        assert_eq!(relay.count(TradeAction::Buy, "PairA"), 1);
        assert_eq!(relay.count(TradeAction::Sell, "PairA"), 1);
        assert_eq!(relay.intents().len(), 3);
    }
}
