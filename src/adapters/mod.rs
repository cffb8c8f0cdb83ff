//! Adapters Layer - External System Implementations
//!
//! Implementations of the port traits plus the CLI:
//! - Market Data: Birdeye trending listing and prices
//! - Relay: Telegram trading-bot relay and the paper relay
//! - CLI: command-line parsing

pub mod cli;
pub mod market_data;
pub mod relay;

pub use cli::CliApp;
pub use market_data::{BirdeyeConfig, BirdeyeFeed};
pub use relay::{PaperRelay, TelegramConfig, TelegramRelay};
