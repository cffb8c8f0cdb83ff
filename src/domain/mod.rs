//! Domain Layer - Core trading types for relay-sniper
//!
//! Pure types and rules with no I/O. Everything that talks to the network
//! goes through the ports layer.
//!
//! - `token`: trending-feed candidates
//! - `screener`: liquidity / holders / name scoring
//! - `position`: one open trade and its exit thresholds
//! - `trade`: outbound buy/sell intents

pub mod position;
pub mod screener;
pub mod token;
pub mod trade;

pub use position::{
    ExitThresholds, ExitTrigger, Position, PositionError, PositionStatus, INVALID_POSITION,
};
pub use screener::{FailedCheck, RiskScreener, ScreeningConfig, ScreeningResult};
pub use token::TokenCandidate;
pub use trade::{Quantity, TradeAction, TradeIntent};
