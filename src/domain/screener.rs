//! Risk Screener
//!
//! Scores trending tokens against three cheap heuristics before any buy:
//! liquidity depth, holder count, and a "rug" name check. Pure and
//! deterministic, so the same candidate always gets the same verdict.

use serde::{Deserialize, Serialize};

use super::token::TokenCandidate;

/// Default minimum liquidity (USD) for the liquidity point
pub const DEFAULT_MIN_LIQUIDITY: f64 = 10_000.0;

/// Default minimum holder count for the holders point
pub const DEFAULT_MIN_HOLDERS: u64 = 1_000;

/// Default score needed to accept a candidate
pub const DEFAULT_MIN_SCORE: u8 = 2;

/// Highest score a candidate can reach
pub const MAX_SCORE: u8 = 3;

const RUG_MARKER: &str = "rug";

/// Screening thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningConfig {
    pub min_liquidity: f64,
    pub min_holders: u64,
    pub min_score: u8,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            min_liquidity: DEFAULT_MIN_LIQUIDITY,
            min_holders: DEFAULT_MIN_HOLDERS,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// A check that did not award its point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailedCheck {
    LowLiquidity,
    FewHolders,
    RugName,
}

impl FailedCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailedCheck::LowLiquidity => "low_liquidity",
            FailedCheck::FewHolders => "few_holders",
            FailedCheck::RugName => "rug_name",
        }
    }
}

/// Verdict for one candidate in one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub pair_address: String,
    pub accepted: bool,
    pub score: u8,
    pub failed: Vec<FailedCheck>,
}

impl ScreeningResult {
    /// Comma-separated failed checks, for log lines
    pub fn failed_summary(&self) -> String {
        self.failed
            .iter()
            .map(FailedCheck::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default)]
pub struct RiskScreener {
    config: ScreeningConfig,
}

impl RiskScreener {
    pub fn new(config: ScreeningConfig) -> Self {
        Self { config }
    }

    pub fn screen(&self, candidate: &TokenCandidate) -> ScreeningResult {
        let mut score = 0u8;
        let mut failed = Vec::new();

        if candidate.liquidity > self.config.min_liquidity {
            score += 1;
        } else {
            failed.push(FailedCheck::LowLiquidity);
        }

        if candidate.holders > self.config.min_holders {
            score += 1;
        } else {
            failed.push(FailedCheck::FewHolders);
        }

        if !looks_like_rug(candidate) {
            score += 1;
        } else {
            failed.push(FailedCheck::RugName);
        }

        ScreeningResult {
            pair_address: candidate.pair_address.clone(),
            accepted: score >= self.config.min_score,
            score,
            failed,
        }
    }
}

fn looks_like_rug(candidate: &TokenCandidate) -> bool {
    candidate.symbol.to_lowercase().contains(RUG_MARKER)
        || candidate.name.to_lowercase().contains(RUG_MARKER)
}
