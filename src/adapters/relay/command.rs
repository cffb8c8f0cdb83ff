//! Wire format for trading bot commands
//!
//! ```text
//! /buy <pair> <amount> <CURRENCY> slippage <pct>
//! /sell <pair> ALL
//! /sell <pair> <amount> <CURRENCY>
//! ```

use crate::domain::{Quantity, TradeAction, TradeIntent};

pub const BALANCE_COMMAND: &str = "/balance";

/// Length of a decoded Solana address
const ADDRESS_BYTES: usize = 32;

/// Render one intent as a chat command
pub fn render_command(intent: &TradeIntent, currency: &str) -> String {
    let verb = match intent.action {
        TradeAction::Buy => "/buy",
        TradeAction::Sell => "/sell",
    };

    let mut command = match intent.quantity {
        Quantity::All => format!("{} {} ALL", verb, intent.pair_address),
        Quantity::Base(amount) => format!(
            "{} {} {} {}",
            verb,
            intent.pair_address,
            format_number(amount),
            currency
        ),
    };

    if let (TradeAction::Buy, Some(slippage)) = (intent.action, intent.slippage_pct) {
        command.push_str(&format!(" slippage {}", format_number(slippage)));
    }
    command
}

/// Whether `address` is a base58 string that decodes to 32 bytes
pub fn is_valid_pair_address(address: &str) -> bool {
    bs58::decode(address)
        .into_vec()
        .map(|bytes| bytes.len() == ADDRESS_BYTES)
        .unwrap_or(false)
}

/// Drop a trailing `.0` so whole amounts read like the bot expects
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    const PAIR: &str = "So11111111111111111111111111111111111111112";

    #[test]
    fn test_render_buy() {
        let intent = TradeIntent::buy(PAIR, 5.0, 2.0);
        assert_eq!(
            render_command(&intent, "SOL"),
            format!("/buy {} 5 SOL slippage 2", PAIR)
        );
    }

    #[test]
    fn test_render_fractional_buy() {
        let intent = TradeIntent::buy(PAIR, 0.25, 1.5);
        let re = Regex::new(r"^/buy \S+ 0\.25 SOL slippage 1\.5$").unwrap();
        assert!(re.is_match(&render_command(&intent, "SOL")));
    }

    #[test]
    fn test_render_sell_all() {
        let intent = TradeIntent::sell(PAIR, Quantity::All);
        assert_eq!(render_command(&intent, "SOL"), format!("/sell {} ALL", PAIR));
    }

    #[test]
    fn test_render_partial_sell() {
        let intent = TradeIntent::sell(PAIR, Quantity::Base(1.5));
        assert_eq!(render_command(&intent, "SOL"), format!("/sell {} 1.5 SOL", PAIR));
    }

    #[test]
    fn test_pair_address_validation() {
        assert!(is_valid_pair_address(PAIR));
        assert!(is_valid_pair_address("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"));
        assert!(!is_valid_pair_address(""));
        assert!(!is_valid_pair_address("not-base58-0OIl"));
        assert!(!is_valid_pair_address("abc"));
        assert!(!is_valid_pair_address("So1111 /sell ALL"));
    }
}
