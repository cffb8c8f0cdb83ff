//! Configuration Module
//!
//! Loads configuration from TOML, applies environment overrides, validates.

pub mod loader;

pub use loader::{
    load_config, Config, ConfigError, ExitsSection, FeedSection, LoggingSection, RelaySection,
    ScreeningSection, TradingSection, CONFIGURATION_MISSING,
};
