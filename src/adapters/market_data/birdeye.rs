//! Birdeye Market Feed
//!
//! HTTP client for the trending listing and per-pair price endpoints.
//! One request per call, no retries; the caller decides when to try again.
//!
//! Response parsing is lenient. Listings may sit at the top level or under
//! `data`, numeric fields may arrive as strings, and missing fields default
//! to zero. Entries without an address are dropped.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::domain::TokenCandidate;
use crate::ports::{FeedError, MarketFeed};

/// Keys that may hold the trending list, in lookup order
const LIST_KEYS: [&str; 3] = ["pairs", "tokens", "items"];

/// Feed client configuration
#[derive(Debug, Clone)]
pub struct BirdeyeConfig {
    pub base_url: String,
    pub trending_path: String,
    pub price_path: String,
    pub api_key: String,
    pub chain: Option<String>,
    pub timeout: Duration,
}

impl BirdeyeConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            trending_path: "/trending".to_string(),
            price_path: "/defi/price".to_string(),
            api_key: api_key.into(),
            chain: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_paths(mut self, trending: impl Into<String>, price: impl Into<String>) -> Self {
        self.trending_path = trending.into();
        self.price_path = price.into();
        self
    }

    pub fn with_chain(mut self, chain: Option<String>) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Market feed backed by the Birdeye public API
#[derive(Debug, Clone)]
pub struct BirdeyeFeed {
    config: BirdeyeConfig,
    http: Client,
}

impl BirdeyeFeed {
    pub fn new(config: BirdeyeConfig) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FeedError::Request(e.to_string()))?;
        Ok(Self { config, http })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, FeedError> {
        let mut request = self
            .http
            .get(url)
            .header("x-api-key", &self.config.api_key)
            .header("accept", "application/json")
            .query(query);
        if let Some(chain) = &self.config.chain {
            request = request.header("x-chain", chain);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FeedError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl MarketFeed for BirdeyeFeed {
    async fn fetch_trending(&self) -> Result<Vec<TokenCandidate>, FeedError> {
        let url = self.config.url(&self.config.trending_path);
        let body = self.get_json(&url, &[]).await?;
        let candidates = parse_trending_body(&body)?;
        debug!(count = candidates.len(), "Fetched trending list");
        Ok(candidates)
    }

    async fn fetch_price(&self, pair_address: &str) -> Result<f64, FeedError> {
        let url = self.config.url(&self.config.price_path);
        let body = self.get_json(&url, &[("address", pair_address)]).await?;
        parse_price_body(pair_address, &body)
    }
}

/// Extract trending candidates from a listing response, in feed order
pub fn parse_trending_body(body: &Value) -> Result<Vec<TokenCandidate>, FeedError> {
    let list = find_list(body)
        .ok_or_else(|| FeedError::Malformed("no trending list in response".to_string()))?;

    Ok(list.iter().filter_map(parse_candidate).collect())
}

fn find_list(body: &Value) -> Option<&Vec<Value>> {
    if let Some(list) = body.as_array() {
        return Some(list);
    }
    let scopes = [Some(body), body.get("data")];
    for scope in scopes.into_iter().flatten() {
        if let Some(list) = scope.as_array() {
            return Some(list);
        }
        for key in LIST_KEYS {
            if let Some(list) = scope.get(key).and_then(Value::as_array) {
                return Some(list);
            }
        }
    }
    None
}

fn parse_candidate(entry: &Value) -> Option<TokenCandidate> {
    let address = text_field(entry, &["address", "pairAddress", "pair_address"])?;
    if address.is_empty() {
        return None;
    }

    let symbol = text_field(entry, &["symbol"]).unwrap_or_default();
    let name = text_field(entry, &["name"]).unwrap_or_default();
    let liquidity = number_field(entry, &["liquidity"]).unwrap_or(0.0).max(0.0);
    let holders = number_field(entry, &["holders", "holder"]).unwrap_or(0.0).max(0.0) as u64;
    let price = number_field(entry, &["price", "priceUsd"]).unwrap_or(0.0);

    Some(
        TokenCandidate::new(address, symbol)
            .with_name(name)
            .with_liquidity(liquidity)
            .with_holders(holders)
            .with_price(price),
    )
}

/// Extract the latest price from a price response
pub fn parse_price_body(pair_address: &str, body: &Value) -> Result<f64, FeedError> {
    let data = body.get("data");
    let price = data
        .and_then(|d| number_field(d, &["value", "price"]))
        .or_else(|| data.and_then(as_number))
        .or_else(|| number_field(body, &["value", "price"]))
        .ok_or_else(|| FeedError::NoPrice(pair_address.to_string()))?;

    if !price.is_finite() || price < 0.0 {
        return Err(FeedError::Malformed(format!(
            "price {} for {}",
            price, pair_address
        )));
    }
    Ok(price)
}

fn text_field(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find_map(|value| match value {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn number_field(entry: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find_map(as_number)
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
