//! Configuration Loader
//!
//! Loads configuration from an optional TOML file, applies environment
//! overrides, and validates the result. Secrets (feed API key, relay bot
//! token) normally come from the environment or `.env`, never from source.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{ExitThresholds, ScreeningConfig};

/// Log tag for missing configuration
pub const CONFIGURATION_MISSING: &str = "ConfigurationMissing";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedSection,
    pub relay: RelaySection,
    pub trading: TradingSection,
    pub screening: ScreeningSection,
    pub exits: ExitsSection,
    pub logging: LoggingSection,
}

/// Market feed section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    /// Feed API base URL
    pub base_url: String,
    /// Path of the trending-tokens endpoint
    pub trending_path: String,
    /// Path of the price-by-pair endpoint
    pub price_path: String,
    /// API key sent as `x-api-key` (prefer FEED_API_KEY in the environment)
    pub api_key: Option<String>,
    /// Optional `x-chain` header value
    pub chain: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            base_url: "https://public-api.birdeye.so".to_string(),
            trending_path: "/trending".to_string(),
            price_path: "/defi/price".to_string(),
            api_key: None,
            chain: Some("solana".to_string()),
            timeout_secs: 10,
        }
    }
}

/// Trading relay section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelaySection {
    /// Telegram Bot API base URL
    pub api_url: String,
    /// Chat that receives the trade commands
    pub recipient: String,
    /// Bot token (prefer RELAY_BOT_TOKEN in the environment)
    pub bot_token: Option<String>,
    /// Currency named in buy commands
    pub base_currency: String,
    /// Send timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            recipient: "@solana_trojanbot".to_string(),
            bot_token: None,
            base_currency: "SOL".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Trading cycle section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TradingSection {
    /// Log commands instead of sending them
    pub paper_mode: bool,
    /// Buy size in base currency
    pub trade_amount: f64,
    /// Slippage tolerance in percent
    pub slippage_pct: f64,
    /// Candidates considered per cycle, in feed order
    pub top_n: usize,
    /// Pause between buys within one cycle
    pub buy_spacing_secs: u64,
    /// Sleep between cycles
    pub cycle_interval_secs: u64,
    /// Sleep after an empty or failed trending fetch
    pub empty_feed_backoff_secs: u64,
}

impl Default for TradingSection {
    fn default() -> Self {
        Self {
            paper_mode: true,
            trade_amount: 5.0,
            slippage_pct: 2.0,
            top_n: 3,
            buy_spacing_secs: 10,
            cycle_interval_secs: 1800,
            empty_feed_backoff_secs: 1800,
        }
    }
}

/// Screening thresholds section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreeningSection {
    pub min_liquidity: f64,
    pub min_holders: u64,
    pub min_score: u8,
}

impl Default for ScreeningSection {
    fn default() -> Self {
        let defaults = ScreeningConfig::default();
        Self {
            min_liquidity: defaults.min_liquidity,
            min_holders: defaults.min_holders,
            min_score: defaults.min_score,
        }
    }
}

/// Position exit section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExitsSection {
    /// Stop loss percentage below entry
    pub stop_loss_pct: f64,
    /// Take profit percentage above entry
    pub take_profit_pct: f64,
    /// Price poll interval per open position
    pub poll_interval_secs: u64,
    /// Consecutive failed polls before a position is abandoned
    pub max_feed_failures: u32,
}

impl Default for ExitsSection {
    fn default() -> Self {
        Self {
            stop_loss_pct: 10.0,
            take_profit_pct: 50.0,
            poll_interval_secs: 60,
            max_feed_failures: 3,
        }
    }
}

/// Logging section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Log to file (in addition to stdout)
    pub log_to_file: bool,
    /// Log file path
    pub log_file: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: "logs/relay-sniper.log".to_string(),
        }
    }
}

impl LoggingSection {
    /// Log file path with `~` expanded
    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.log_file).to_string())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Configuration missing: {0}")]
    Missing(String),
}

impl ConfigError {
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::Missing(_) => CONFIGURATION_MISSING,
            _ => "ConfigurationInvalid",
        }
    }
}

/// Load configuration: file (if given), then environment, then validation
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => Config::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

fn first_of(lookup: &impl Fn(&str) -> Option<String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(*key))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match first_of(lookup, &[key]) {
        None => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::InvalidEnv {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn parse_bool_override(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<bool>, ConfigError> {
    match first_of(lookup, &[key]).map(|v| v.to_lowercase()) {
        None => Ok(None),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(Some(true)),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(Some(false)),
        Some(v) => Err(ConfigError::InvalidEnv {
            key: key.to_string(),
            value: v,
        }),
    }
}

impl Config {
    /// Apply environment overrides through `lookup` (normally `std::env::var`)
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(key) = first_of(&lookup, &["FEED_API_KEY", "BIRDEYE_API_KEY"]) {
            self.feed.api_key = Some(key);
        }
        if let Some(url) = first_of(&lookup, &["FEED_BASE_URL"]) {
            self.feed.base_url = url;
        }
        if let Some(token) = first_of(&lookup, &["RELAY_BOT_TOKEN", "BOT_TOKEN"]) {
            self.relay.bot_token = Some(token);
        }
        if let Some(recipient) = first_of(&lookup, &["RELAY_RECIPIENT"]) {
            self.relay.recipient = recipient;
        }

        if let Some(v) = parse_bool_override(&lookup, "PAPER_MODE")? {
            self.trading.paper_mode = v;
        }
        if let Some(v) = parse_override(&lookup, "TRADE_AMOUNT")? {
            self.trading.trade_amount = v;
        }
        if let Some(v) = parse_override(&lookup, "SLIPPAGE_PCT")? {
            self.trading.slippage_pct = v;
        }
        if let Some(v) = parse_override(&lookup, "CYCLE_INTERVAL_SECS")? {
            self.trading.cycle_interval_secs = v;
        }
        if let Some(v) = parse_override(&lookup, "EMPTY_FEED_BACKOFF_SECS")? {
            self.trading.empty_feed_backoff_secs = v;
        }
        if let Some(v) = parse_override(&lookup, "STOP_LOSS_PCT")? {
            self.exits.stop_loss_pct = v;
        }
        if let Some(v) = parse_override(&lookup, "TAKE_PROFIT_PCT")? {
            self.exits.take_profit_pct = v;
        }
        if let Some(v) = parse_override(&lookup, "POLL_INTERVAL_SECS")? {
            self.exits.poll_interval_secs = v;
        }

        Ok(())
    }

    /// Validate all numeric parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.base_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "feed.base_url cannot be empty".to_string(),
            ));
        }

        if !(self.trading.trade_amount > 0.0 && self.trading.trade_amount.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "trade_amount must be > 0, got {}",
                self.trading.trade_amount
            )));
        }

        if !(self.trading.slippage_pct > 0.0 && self.trading.slippage_pct <= 100.0) {
            return Err(ConfigError::ValidationError(format!(
                "slippage_pct must be 0-100, got {}",
                self.trading.slippage_pct
            )));
        }

        if self.trading.top_n == 0 {
            return Err(ConfigError::ValidationError(
                "top_n must be > 0".to_string(),
            ));
        }

        if self.trading.cycle_interval_secs == 0 || self.trading.empty_feed_backoff_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_interval_secs and empty_feed_backoff_secs must be > 0".to_string(),
            ));
        }

        if self.screening.min_score > crate::domain::screener::MAX_SCORE {
            return Err(ConfigError::ValidationError(format!(
                "min_score must be 0-{}, got {}",
                crate::domain::screener::MAX_SCORE,
                self.screening.min_score
            )));
        }

        if !(self.exits.stop_loss_pct > 0.0 && self.exits.stop_loss_pct < 100.0) {
            return Err(ConfigError::ValidationError(format!(
                "stop_loss_pct must be between 0 and 100, got {}",
                self.exits.stop_loss_pct
            )));
        }

        if !(self.exits.take_profit_pct > 0.0 && self.exits.take_profit_pct.is_finite()) {
            return Err(ConfigError::ValidationError(format!(
                "take_profit_pct must be > 0, got {}",
                self.exits.take_profit_pct
            )));
        }

        if self.exits.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.exits.max_feed_failures == 0 {
            return Err(ConfigError::ValidationError(
                "max_feed_failures must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Feed API key, required for every command that touches the feed
    pub fn require_feed_api_key(&self) -> Result<String, ConfigError> {
        self.feed
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::Missing("feed API key (FEED_API_KEY)".to_string()))
    }

    /// Relay bot token and recipient, required to send real commands
    pub fn require_relay_credentials(&self) -> Result<(String, String), ConfigError> {
        let token = self
            .relay
            .bot_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ConfigError::Missing("relay bot token (RELAY_BOT_TOKEN)".to_string())
            })?;
        if self.relay.recipient.is_empty() {
            return Err(ConfigError::Missing("relay recipient (RELAY_RECIPIENT)".to_string()));
        }
        Ok((token, self.relay.recipient.clone()))
    }

    pub fn screening_config(&self) -> ScreeningConfig {
        ScreeningConfig {
            min_liquidity: self.screening.min_liquidity,
            min_holders: self.screening.min_holders,
            min_score: self.screening.min_score,
        }
    }

    pub fn exit_thresholds(&self) -> ExitThresholds {
        ExitThresholds::from_percent(self.exits.stop_loss_pct, self.exits.take_profit_pct)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.exits.poll_interval_secs)
    }
}
