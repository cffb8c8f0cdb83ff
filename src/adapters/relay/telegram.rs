//! Telegram relay
//!
//! Sends trade commands as chat messages to a trading bot through the
//! Telegram Bot API (`sendMessage`). A send is accepted when Telegram
//! acknowledges delivery with `{"ok": true}`; whether the trading bot then
//! fills the order is outside what this relay can observe.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use super::command::{is_valid_pair_address, render_command};
use crate::domain::TradeIntent;
use crate::ports::{RelayOutcome, TradeRelay, RELAY_REJECTED};

/// Reasons a send did not go through
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid pair address: {0}")]
    InvalidAddress(String),
    #[error("send failed: {0}")]
    Transport(String),
    #[error("relay returned status {0}")]
    Status(u16),
    #[error("relay refused message: {0}")]
    Refused(String),
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_url: String,
    pub bot_token: String,
    /// Chat id or `@username` of the trading bot
    pub recipient: String,
    pub base_currency: String,
    pub timeout: Duration,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            bot_token: bot_token.into(),
            recipient: recipient.into(),
            base_currency: "SOL".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_base_currency(mut self, currency: impl Into<String>) -> Self {
        self.base_currency = currency.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_url.trim_end_matches('/'),
            self.bot_token
        )
    }
}

/// Bot API envelope; only the ack matters here
#[derive(Debug, Deserialize)]
struct SendAck {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramRelay {
    config: TelegramConfig,
    http: Client,
}

impl TelegramRelay {
    pub fn new(config: TelegramConfig) -> Result<Self, RelayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// Send raw text to the recipient, e.g. `/balance`
    pub async fn send_text(&self, text: &str) -> Result<(), RelayError> {
        let body = json!({
            "chat_id": self.config.recipient,
            "text": text,
        });

        let response = self
            .http
            .post(self.config.send_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| RelayError::Transport(redact(&e.to_string(), &self.config.bot_token)))?;

        let status = response.status();
        let ack: Option<SendAck> = response.json().await.ok();
        parse_ack(status.as_u16(), ack)
    }
}

fn parse_ack(status: u16, ack: Option<SendAck>) -> Result<(), RelayError> {
    match ack {
        Some(SendAck { ok: true, .. }) => Ok(()),
        Some(SendAck {
            description: Some(reason),
            ..
        }) => Err(RelayError::Refused(reason)),
        _ if !(200..300).contains(&status) => Err(RelayError::Status(status)),
        _ => Err(RelayError::Refused("no acknowledgement".to_string())),
    }
}

/// Keep the bot token out of logs
fn redact(message: &str, token: &str) -> String {
    if token.is_empty() {
        message.to_string()
    } else {
        message.replace(token, "<redacted>")
    }
}

#[async_trait]
impl TradeRelay for TelegramRelay {
    async fn submit(&self, intent: &TradeIntent) -> RelayOutcome {
        if !is_valid_pair_address(&intent.pair_address) {
            let err = RelayError::InvalidAddress(intent.pair_address.clone());
            warn!(pair = %intent.pair_address, error_kind = RELAY_REJECTED, "{}", err);
            return RelayOutcome::Rejected(err.to_string());
        }

        let command = render_command(intent, &self.config.base_currency);
        match self.send_text(&command).await {
            Ok(()) => {
                info!(
                    pair = %intent.pair_address,
                    action = %intent.action,
                    "Relayed: {}", command
                );
                RelayOutcome::Accepted
            }
            Err(e) => {
                warn!(
                    pair = %intent.pair_address,
                    action = %intent.action,
                    error_kind = RELAY_REJECTED,
                    "Relay failed: {}", e
                );
                RelayOutcome::Rejected(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Quantity;

    #[test]
    fn test_send_url() {
        let config =
            TelegramConfig::new("123:abc", "@trading_bot").with_api_url("https://tg.example.com/");
        assert_eq!(
            config.send_url(),
            "https://tg.example.com/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn test_ack_ok() {
        let ack: SendAck =
            serde_json::from_str(r#"{"ok":true,"result":{"message_id":7}}"#).unwrap();
        assert!(parse_ack(200, Some(ack)).is_ok());
    }

    #[test]
    fn test_ack_refused() {
        let body = r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#;
        let ack: SendAck = serde_json::from_str(body).unwrap();
        match parse_ack(400, Some(ack)) {
            Err(RelayError::Refused(reason)) => assert!(reason.contains("chat not found")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_ack_missing() {
        assert!(matches!(parse_ack(502, None), Err(RelayError::Status(502))));
        assert!(matches!(parse_ack(200, None), Err(RelayError::Refused(_))));
    }

    #[test]
    fn test_redact_token() {
        let msg = "error sending request for url (https://api.telegram.org/bot123:abc/sendMessage)";
        assert!(!redact(msg, "123:abc").contains("123:abc"));
    }

    const VALID_PAIR: &str = "So11111111111111111111111111111111111111112";

    /// Relay pointed at a port nothing listens on
    fn unreachable_relay() -> TelegramRelay {
        let config = TelegramConfig::new("123:abc", "@bot")
            .with_api_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_millis(200));
        TelegramRelay::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_address_rejected_without_sending() {
        // A send attempt would fail with Transport, not InvalidAddress
        let relay = unreachable_relay();

        match relay.submit_buy("bad address", 1.0, 2.0).await {
            RelayOutcome::Rejected(reason) => assert!(reason.contains("invalid pair address")),
            RelayOutcome::Accepted => panic!("invalid address must not be accepted"),
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_rejected() {
        let relay = unreachable_relay();

        match relay.submit_buy(VALID_PAIR, 5.0, 2.0).await {
            RelayOutcome::Rejected(reason) => {
                assert!(reason.starts_with("send failed"), "{reason}");
                assert!(!reason.contains("123:abc"), "token leaked: {reason}");
            }
            RelayOutcome::Accepted => panic!("unreachable relay must not accept"),
        }

        let outcome = relay.submit_sell(VALID_PAIR, Quantity::All).await;
        assert!(matches!(outcome, RelayOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn test_send_text_transport_error() {
        let relay = unreachable_relay();
        let result = relay.send_text("/balance").await;
        assert!(matches!(result, Err(RelayError::Transport(_))));
    }
}
