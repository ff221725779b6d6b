//! Run context (cash, unsettled proceeds, the position slot) and the
//! per-step account snapshot that forms the equity curve.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::position::{Position, PositionState};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub date: NaiveDateTime,
    pub cash: f64,
    pub equity: f64,
    pub unsettled_cash: f64,
    pub position: Option<Position>,
}

/// Mutable state of one simulation run. Created at the start of a run,
/// threaded by reference through each step, and dropped when the run ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub unsettled_cash: f64,
    pub state: PositionState,
    pub last_deposit: Option<NaiveDateTime>,
    pub last_exit: Option<NaiveDateTime>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            unsettled_cash: 0.0,
            state: PositionState::Flat,
            last_deposit: None,
            last_exit: None,
        }
    }

    /// cash + unsettled cash + position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        let marked = self
            .state
            .position()
            .map(|p| p.market_value(price))
            .unwrap_or(0.0);
        self.cash + self.unsettled_cash + marked
    }

    pub fn snapshot(&self, date: NaiveDateTime, price: f64) -> AccountState {
        AccountState {
            date,
            cash: self.cash,
            equity: self.equity(price),
            unsettled_cash: self.unsettled_cash,
            position: self.state.position().cloned(),
        }
    }
}

/// Whole days elapsed from `from` to `to`, floored.
pub fn whole_days_between(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    (to - from).num_seconds().div_euclid(86_400)
}
