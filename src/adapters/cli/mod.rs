//! CLI Adapter
//!
//! Command-line interface for relay-sniper, built on clap derive.

mod commands;

pub use commands::{BalanceCmd, CliApp, Command, PriceCmd, RunCmd, ScanCmd};
