use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `error_kind` logged when a position cannot be built from a buy
pub const INVALID_POSITION: &str = "InvalidPosition";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionStatus {
    Open,
    ClosedStopLoss,
    ClosedTakeProfit,
    ClosedError,
}

impl PositionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PositionStatus::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::Open => "OPEN",
            PositionStatus::ClosedStopLoss => "CLOSED_STOP_LOSS",
            PositionStatus::ClosedTakeProfit => "CLOSED_TAKE_PROFIT",
            PositionStatus::ClosedError => "CLOSED_ERROR",
        }
    }
}

/// Which threshold a price crossed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    StopLoss,
    TakeProfit,
}

impl ExitTrigger {
    pub fn closing_status(&self) -> PositionStatus {
        match self {
            ExitTrigger::StopLoss => PositionStatus::ClosedStopLoss,
            ExitTrigger::TakeProfit => PositionStatus::ClosedTakeProfit,
        }
    }
}

/// Exit distances as fractions of the entry price (0.10 = 10%)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitThresholds {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl ExitThresholds {
    /// Build from percent values as written in config (10.0 = 10%)
    pub fn from_percent(stop_loss: f64, take_profit: f64) -> Self {
        Self {
            stop_loss_pct: stop_loss / 100.0,
            take_profit_pct: take_profit / 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub pair_address: String,
    pub symbol: String,
    pub entry_price: f64,
    pub stop_loss_price: f64,
    pub take_profit_price: f64,
    pub status: PositionStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    /// Price that triggered the exit, if one did
    pub exit_price: Option<f64>,
}

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("Position is already closed")]
    AlreadyClosed,
    #[error("Invalid entry price: {0}")]
    InvalidEntryPrice(f64),
    #[error("Invalid exit thresholds: stop_loss={0}, take_profit={1}")]
    InvalidThresholds(f64, f64),
    #[error("Cannot close into non-terminal status {0:?}")]
    NotTerminal(PositionStatus),
}

impl PositionError {
    pub fn kind(&self) -> &'static str {
        INVALID_POSITION
    }
}

impl Position {
    pub fn open(
        pair_address: impl Into<String>,
        symbol: impl Into<String>,
        entry_price: f64,
        thresholds: ExitThresholds,
    ) -> Result<Self, PositionError> {
        if !entry_price.is_finite() || entry_price <= 0.0 {
            return Err(PositionError::InvalidEntryPrice(entry_price));
        }
        let ExitThresholds {
            stop_loss_pct,
            take_profit_pct,
        } = thresholds;
        if !(stop_loss_pct > 0.0 && stop_loss_pct < 1.0)
            || !(take_profit_pct > 0.0 && take_profit_pct.is_finite())
        {
            return Err(PositionError::InvalidThresholds(stop_loss_pct, take_profit_pct));
        }

        Ok(Self {
            pair_address: pair_address.into(),
            symbol: symbol.into(),
            entry_price,
            stop_loss_price: entry_price * (1.0 - stop_loss_pct),
            take_profit_price: entry_price * (1.0 + take_profit_pct),
            status: PositionStatus::Open,
            opened_at: Utc::now(),
            closed_at: None,
            exit_price: None,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    /// Check a price against both thresholds. Stop-loss wins when both match.
    pub fn evaluate(&self, price: f64) -> Option<ExitTrigger> {
        if !self.is_open() {
            return None;
        }
        if price <= self.stop_loss_price {
            Some(ExitTrigger::StopLoss)
        } else if price >= self.take_profit_price {
            Some(ExitTrigger::TakeProfit)
        } else {
            None
        }
    }

    pub fn close(
        &mut self,
        status: PositionStatus,
        exit_price: Option<f64>,
    ) -> Result<(), PositionError> {
        if self.status != PositionStatus::Open {
            return Err(PositionError::AlreadyClosed);
        }
        if !status.is_terminal() {
            return Err(PositionError::NotTerminal(status));
        }
        self.status = status;
        self.exit_price = exit_price;
        self.closed_at = Some(Utc::now());
        Ok(())
    }

    /// Profit/loss percentage against entry
    pub fn pnl_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn thresholds() -> ExitThresholds {
        ExitThresholds::from_percent(10.0, 50.0)
    }

    #[test]
    fn test_open_computes_thresholds() {
        let position = Position::open("Pair1", "BONK", 100.0, thresholds()).unwrap();
        assert_eq!(position.status, PositionStatus::Open);
        assert_relative_eq!(position.stop_loss_price, 90.0, epsilon = 1e-9);
        assert_relative_eq!(position.take_profit_price, 150.0, epsilon = 1e-9);
        assert!(position.closed_at.is_none());
    }

    #[test]
    fn test_open_invalid_price() {
        let result = Position::open("Pair1", "BONK", 0.0, thresholds());
        assert!(matches!(result, Err(PositionError::InvalidEntryPrice(_))));
        let result = Position::open("Pair1", "BONK", f64::INFINITY, thresholds());
        assert!(matches!(result, Err(PositionError::InvalidEntryPrice(_))));
    }

    #[test]
    fn test_open_invalid_thresholds() {
        for (stop_loss, take_profit) in [
            (100.0, 50.0),
            (10.0, 0.0),
            (f64::NAN, 50.0),
            (10.0, f64::NAN),
            (10.0, f64::INFINITY),
        ] {
            let thresholds = ExitThresholds::from_percent(stop_loss, take_profit);
            let result = Position::open("Pair1", "BONK", 1.0, thresholds);
            assert!(matches!(result, Err(PositionError::InvalidThresholds(_, _))));
        }
    }

    #[test]
    fn test_evaluate() {
        let position = Position::open("Pair1", "BONK", 100.0, thresholds()).unwrap();
        assert_eq!(position.evaluate(95.0), None);
        assert_eq!(position.evaluate(90.0), Some(ExitTrigger::StopLoss));
        assert_eq!(position.evaluate(10.0), Some(ExitTrigger::StopLoss));
        assert_eq!(position.evaluate(150.0), Some(ExitTrigger::TakeProfit));
        assert_eq!(position.evaluate(149.99), None);
    }

    #[test]
    fn test_stop_loss_checked_first() {
        // Degenerate thresholds where one price satisfies both checks
        let mut position = Position::open("Pair1", "BONK", 100.0, thresholds()).unwrap();
        position.take_profit_price = 80.0;
        assert_eq!(position.evaluate(85.0), Some(ExitTrigger::StopLoss));
    }

    #[test]
    fn test_close_position() {
        let mut position = Position::open("Pair1", "BONK", 100.0, thresholds()).unwrap();
        position.close(PositionStatus::ClosedTakeProfit, Some(151.0)).unwrap();
        assert_eq!(position.status, PositionStatus::ClosedTakeProfit);
        assert_eq!(position.exit_price, Some(151.0));
        assert!(position.closed_at.is_some());
        assert_eq!(position.evaluate(10.0), None);
    }

    #[test]
    fn test_close_already_closed() {
        let mut position = Position::open("Pair1", "BONK", 100.0, thresholds()).unwrap();
        position.close(PositionStatus::ClosedError, None).unwrap();
        let result = position.close(PositionStatus::ClosedStopLoss, Some(1.0));
        assert!(matches!(result, Err(PositionError::AlreadyClosed)));
        assert_eq!(position.status, PositionStatus::ClosedError);
    }

    #[test]
    fn test_close_requires_terminal_status() {
        let mut position = Position::open("Pair1", "BONK", 100.0, thresholds()).unwrap();
        let result = position.close(PositionStatus::Open, None);
        assert!(matches!(result, Err(PositionError::NotTerminal(PositionStatus::Open))));
        assert!(position.is_open());
    }

    #[test]
    fn test_pnl_pct() {
        let position = Position::open("Pair1", "BONK", 100.0, thresholds()).unwrap();
        assert_relative_eq!(position.pnl_pct(150.0), 50.0, epsilon = 1e-9);
        assert_relative_eq!(position.pnl_pct(90.0), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PositionStatus::ClosedStopLoss).unwrap();
        assert_eq!(json, "\"CLOSED_STOP_LOSS\"");
        assert_eq!(PositionStatus::ClosedTakeProfit.as_str(), "CLOSED_TAKE_PROFIT");
    }
}
