//! Open positions, closed trades, and the single-slot position state.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    TimeStop,
    SignalExit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "STOP_LOSS"),
            ExitReason::TimeStop => write!(f, "TIME_STOP"),
            ExitReason::SignalExit => write!(f, "SIGNAL_EXIT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub entry_date: NaiveDateTime,
    pub entry_price: f64,
    pub shares: f64,
    pub direction: Direction,
    pub ticker: String,
    pub stop_loss: f64,
    pub days_held: i64,
}

impl Position {
    pub fn cost(&self) -> f64 {
        self.shares * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn should_stop_loss(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop_loss,
            Direction::Short => price >= self.stop_loss,
        }
    }

    pub fn pnl(&self, exit_price: f64) -> f64 {
        match self.direction {
            Direction::Long => (exit_price - self.entry_price) * self.shares,
            Direction::Short => (self.entry_price - exit_price) * self.shares,
        }
    }

    pub fn pnl_percent(&self, exit_price: f64) -> f64 {
        match self.direction {
            Direction::Long => (exit_price - self.entry_price) / self.entry_price * 100.0,
            Direction::Short => (self.entry_price - exit_price) / self.entry_price * 100.0,
        }
    }

    /// Consume the position into its closed trade record.
    pub fn close(self, exit_date: NaiveDateTime, exit_price: f64, reason: ExitReason) -> Trade {
        let pnl = self.pnl(exit_price);
        let pnl_percent = self.pnl_percent(exit_price);
        Trade {
            entry_date: self.entry_date,
            exit_date,
            ticker: self.ticker,
            direction: self.direction,
            entry_price: self.entry_price,
            exit_price,
            shares: self.shares,
            pnl,
            pnl_percent,
            exit_reason: reason,
            days_held: self.days_held,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub entry_date: NaiveDateTime,
    pub exit_date: NaiveDateTime,
    pub ticker: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub shares: f64,
    pub pnl: f64,
    pub pnl_percent: f64,
    pub exit_reason: ExitReason,
    pub days_held: i64,
}

/// The one position slot of a run: FLAT or OPEN.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PositionState {
    #[default]
    Flat,
    Open(Position),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }

    pub fn position(&self) -> Option<&Position> {
        match self {
            PositionState::Flat => None,
            PositionState::Open(position) => Some(position),
        }
    }

    /// Leave the slot FLAT, returning whatever was open.
    pub fn take(&mut self) -> Option<Position> {
        match std::mem::take(self) {
            PositionState::Flat => None,
            PositionState::Open(position) => Some(position),
        }
    }
}
