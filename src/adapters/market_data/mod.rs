//! Market Data Adapters
//!
//! - `BirdeyeFeed`: trending listing and per-pair prices over HTTP

mod birdeye;

pub use birdeye::{parse_price_body, parse_trending_body, BirdeyeConfig, BirdeyeFeed};
