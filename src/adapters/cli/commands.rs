//! CLI command definitions for relay-sniper.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// relay-sniper - trending-token sniper that trades through a chat relay
#[derive(Parser, Debug)]
#[command(
    name = "relay-sniper",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Trending-token sniper that trades through a chat relay",
    long_about = "relay-sniper scans a market feed for trending tokens, screens them with \
                  liquidity, holder and name checks, buys through a trading bot relay, and \
                  sells each position on stop-loss or take-profit."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the trading loop
    Run(RunCmd),

    /// Fetch and screen the trending list once, without trading
    Scan(ScanCmd),

    /// Print the current price of one pair
    Price(PriceCmd),

    /// Ask the trading bot for the wallet balance
    Balance(BalanceCmd),
}

/// Start trading loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Run in paper trading mode (commands are logged, not sent)
    #[arg(short, long, conflicts_with = "live")]
    pub paper: bool,

    /// Send real commands to the relay (requires --i-accept-losses)
    #[arg(long, help = "Send real commands to the relay")]
    pub live: bool,

    /// Acknowledge risk of financial loss (required for --live)
    #[arg(long, help = "Acknowledge risk of financial loss")]
    pub i_accept_losses: bool,
}

impl RunCmd {
    /// Paper mode after flags: --paper forces it, --live clears it,
    /// otherwise the config decides
    pub fn paper_mode(&self, configured: bool) -> bool {
        if self.paper {
            true
        } else if self.live {
            false
        } else {
            configured
        }
    }
}

/// Scan once
#[derive(Parser, Debug)]
pub struct ScanCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show every candidate, not only the top N
    #[arg(short, long)]
    pub all: bool,
}

/// Price lookup
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Pair address to look up
    #[arg(value_name = "PAIR")]
    pub pair: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Balance request
#[derive(Parser, Debug)]
pub struct BalanceCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_live() {
        let app = CliApp::parse_from(["relay-sniper", "run", "--live", "--i-accept-losses"]);
        match app.command {
            Command::Run(cmd) => {
                assert!(cmd.live);
                assert!(cmd.i_accept_losses);
                assert!(!cmd.paper_mode(true));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_paper_and_live_conflict() {
        let result = CliApp::try_parse_from(["relay-sniper", "run", "--paper", "--live"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_paper_mode_defaults_to_config() {
        let cmd = RunCmd {
            config: None,
            paper: false,
            live: false,
            i_accept_losses: false,
        };
        assert!(cmd.paper_mode(true));
        assert!(!cmd.paper_mode(false));

        let cmd = RunCmd { paper: true, ..cmd };
        assert!(cmd.paper_mode(false));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let app = CliApp::parse_from([
            "relay-sniper",
            "price",
            "PairA",
            "--debug",
            "-c",
            "sniper.toml",
        ]);
        assert!(app.debug);
        match app.command {
            Command::Price(cmd) => {
                assert_eq!(cmd.pair, "PairA");
                assert_eq!(cmd.config, Some(PathBuf::from("sniper.toml")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
