//! relay-sniper - trending-token sniper that trades through a chat relay

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use relay_sniper::adapters::cli::{BalanceCmd, CliApp, Command, PriceCmd, RunCmd, ScanCmd};
use relay_sniper::adapters::market_data::{BirdeyeConfig, BirdeyeFeed};
use relay_sniper::adapters::relay::{PaperRelay, TelegramConfig, TelegramRelay, BALANCE_COMMAND};
use relay_sniper::application::{OrchestratorSettings, TradingOrchestrator};
use relay_sniper::config::{load_config, Config, ConfigError, LoggingSection};
use relay_sniper::domain::RiskScreener;
use relay_sniper::ports::{MarketFeed, TradeRelay};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config = load_config(config_path(&app.command)).context("Failed to load configuration")?;
    init_logging(&config.logging, app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Scan(cmd) => scan_command(cmd, config).await,
        Command::Price(cmd) => price_command(cmd, config).await,
        Command::Balance(cmd) => balance_command(cmd, config).await,
    }
}

fn config_path(command: &Command) -> Option<&Path> {
    match command {
        Command::Run(cmd) => cmd.config.as_deref(),
        Command::Scan(cmd) => cmd.config.as_deref(),
        Command::Price(cmd) => cmd.config.as_deref(),
        Command::Balance(cmd) => cmd.config.as_deref(),
    }
}

/// Level precedence: --debug, --verbose, RUST_LOG, then [logging].level
fn init_logging(logging: &LoggingSection, verbose: bool, debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("relay_sniper=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let file_layer = if logging.log_to_file {
        let path = logging.log_path();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .init();

    Ok(())
}

/// Log a missing-configuration error with its kind before bailing out
fn required<T>(result: Result<T, ConfigError>) -> Result<T> {
    result.map_err(|e| {
        tracing::error!(error_kind = e.kind(), "{}", e);
        anyhow::Error::new(e)
    })
}

fn build_feed(config: &Config) -> Result<Arc<dyn MarketFeed>> {
    let api_key = required(config.require_feed_api_key())?;
    let feed_config = BirdeyeConfig::new(&config.feed.base_url, api_key)
        .with_paths(&config.feed.trending_path, &config.feed.price_path)
        .with_chain(config.feed.chain.clone())
        .with_timeout(Duration::from_secs(config.feed.timeout_secs));
    let feed = BirdeyeFeed::new(feed_config).context("Failed to create feed client")?;
    Ok(Arc::new(feed))
}

fn build_telegram(config: &Config) -> Result<TelegramRelay> {
    let (token, recipient) = required(config.require_relay_credentials())?;
    let relay_config = TelegramConfig::new(token, recipient)
        .with_api_url(&config.relay.api_url)
        .with_base_currency(&config.relay.base_currency)
        .with_timeout(Duration::from_secs(config.relay.timeout_secs));
    TelegramRelay::new(relay_config).context("Failed to create relay client")
}

async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    tracing::info!("Starting relay-sniper...");

    let paper = cmd.paper_mode(config.trading.paper_mode);
    if !paper && !cmd.i_accept_losses {
        bail!("Live trading requires --i-accept-losses (or run with --paper)");
    }

    let feed = build_feed(&config)?;
    let relay: Arc<dyn TradeRelay> = if paper {
        tracing::warn!("PAPER TRADING MODE - commands are logged, not sent");
        Arc::new(PaperRelay::new(&config.relay.base_currency))
    } else {
        tracing::warn!(
            recipient = %config.relay.recipient,
            "LIVE MODE - commands go to the trading bot"
        );
        Arc::new(build_telegram(&config)?)
    };

    let orchestrator = TradingOrchestrator::new(feed, relay, OrchestratorSettings::from(&config))
        .context("Failed to create orchestrator")?;

    // Setup Ctrl+C handler
    let orch = orchestrator.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        orch.stop().await;
    });

    orchestrator.run().await?;
    tracing::info!("relay-sniper stopped");
    Ok(())
}

async fn scan_command(cmd: ScanCmd, config: Config) -> Result<()> {
    let feed = build_feed(&config)?;
    let screener = RiskScreener::new(config.screening_config());

    let candidates = feed.fetch_trending().await.context("Failed to fetch trending list")?;
    if candidates.is_empty() {
        println!("Feed returned no trending tokens");
        return Ok(());
    }

    let mut seen = std::collections::HashSet::new();
    let limit = if cmd.all { usize::MAX } else { config.trading.top_n };

    println!(
        "{:<3} {:<46} {:<10} {:>14} {:>8} {:>5}  {}",
        "#", "PAIR", "SYMBOL", "LIQUIDITY", "HOLDERS", "SCORE", "VERDICT"
    );
    for (rank, candidate) in candidates
        .iter()
        .filter(|c| seen.insert(c.pair_address.clone()))
        .take(limit)
        .enumerate()
    {
        let result = screener.screen(candidate);
        let verdict = if result.accepted {
            "BUY".to_string()
        } else {
            format!("skip ({})", result.failed_summary())
        };
        println!(
            "{:<3} {:<46} {:<10} {:>14.0} {:>8} {:>5}  {}",
            rank + 1,
            candidate.pair_address,
            candidate.symbol,
            candidate.liquidity,
            candidate.holders,
            result.score,
            verdict
        );
    }

    Ok(())
}

async fn price_command(cmd: PriceCmd, config: Config) -> Result<()> {
    let feed = build_feed(&config)?;
    let price = feed
        .fetch_price(&cmd.pair)
        .await
        .with_context(|| format!("Failed to fetch price for {}", cmd.pair))?;

    println!("{}: {}", cmd.pair, price);
    Ok(())
}

async fn balance_command(_cmd: BalanceCmd, config: Config) -> Result<()> {
    let relay = build_telegram(&config)?;
    relay
        .send_text(BALANCE_COMMAND)
        .await
        .context("Failed to send balance request")?;

    println!(
        "Sent {} to {}; the reply arrives in the chat",
        BALANCE_COMMAND, config.relay.recipient
    );
    Ok(())
}
