//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The market feed (trending listings, pair prices)
//! - The trading relay (buy/sell commands)

pub mod execution;
pub mod market_data;
pub mod mocks;

pub use execution::{RelayOutcome, TradeRelay, RELAY_REJECTED};
pub use market_data::{FeedError, MarketFeed, FEED_UNAVAILABLE};
