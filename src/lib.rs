//! relay-sniper - trending-token sniper library
//!
//! Discovers trending tokens on a market feed, screens them with simple risk
//! heuristics, buys through a chat-based trading relay, and watches every
//! open position until its stop-loss or take-profit fires.
//!
//! # Modules
//!
//! - `domain`: Core types and rules (TokenCandidate, RiskScreener, Position, TradeIntent)
//! - `ports`: Trait abstractions (MarketFeed, TradeRelay) and scripted test doubles
//! - `adapters`: External implementations (Birdeye feed, Telegram relay, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Orchestrator, position monitors, open-position registry

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
