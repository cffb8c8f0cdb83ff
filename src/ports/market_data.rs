use async_trait::async_trait;
use thiserror::Error;

use crate::domain::TokenCandidate;

/// Log tag for every feed failure
pub const FEED_UNAVAILABLE: &str = "FeedUnavailable";

/// Market feed error type. Every variant means the feed is unavailable
/// for this call; callers skip and try again later.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Feed request failed: {0}")]
    Request(String),

    #[error("Feed returned status {0}")]
    Status(u16),

    #[error("Malformed feed response: {0}")]
    Malformed(String),

    #[error("No price for pair {0}")]
    NoPrice(String),
}

impl FeedError {
    pub fn kind(&self) -> &'static str {
        FEED_UNAVAILABLE
    }
}

/// Market data port: trending listings and single-pair prices
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Fetch the current trending list, in feed order.
    /// One request, no retries.
    async fn fetch_trending(&self) -> Result<Vec<TokenCandidate>, FeedError>;

    /// Fetch the latest price for one pair
    async fn fetch_price(&self, pair_address: &str) -> Result<f64, FeedError>;
}
