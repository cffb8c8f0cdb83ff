//! Trading Relay Adapters
//!
//! - `TelegramRelay`: sends commands to a trading bot over the Telegram Bot API
//! - `PaperRelay`: logs commands, sends nothing

mod command;
mod paper;
mod telegram;

pub use command::{is_valid_pair_address, render_command, BALANCE_COMMAND};
pub use paper::PaperRelay;
pub use telegram::{RelayError, TelegramConfig, TelegramRelay};
