//! Summary statistics over a finished run.

use serde::Serialize;

use super::portfolio::AccountState;
use super::position::Trade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_return: f64,
    pub total_return_percent: f64,
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub sharpe_ratio: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub profit_factor: f64,
    pub average_days_held: f64,
}

impl Summary {
    pub fn compute(trades: &[Trade], equity_curve: &[AccountState]) -> Self {
        let equity: Vec<f64> = equity_curve.iter().map(|s| s.equity).collect();

        let total_trades = trades.len();
        let wins: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p > 0.0).collect();
        let losses: Vec<f64> = trades.iter().map(|t| t.pnl).filter(|&p| p < 0.0).collect();

        let win_rate = if total_trades > 0 {
            wins.len() as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        let (total_return, total_return_percent) = match (equity.first(), equity.last()) {
            (Some(&first), Some(&last)) => {
                let change = last - first;
                let percent = if first > 0.0 { change / first * 100.0 } else { 0.0 };
                (change, percent)
            }
            _ => (0.0, 0.0),
        };

        let average_win = mean(&wins);
        let average_loss = mean(&losses);

        // Zero with no losers, even when every trade won.
        let profit_factor = if losses.is_empty() || average_loss == 0.0 {
            0.0
        } else {
            (average_win * wins.len() as f64 / (average_loss * losses.len() as f64)).abs()
        };

        let (max_drawdown, max_drawdown_percent) = compute_drawdown(&equity);
        let days: Vec<f64> = trades.iter().map(|t| t.days_held as f64).collect();

        Summary {
            total_trades,
            winning_trades: wins.len(),
            losing_trades: losses.len(),
            win_rate,
            total_return,
            total_return_percent,
            max_drawdown,
            max_drawdown_percent,
            sharpe_ratio: compute_sharpe(&equity),
            average_win,
            average_loss,
            profit_factor,
            average_days_held: mean(&days),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Largest peak-to-trough decline, absolute and as percent of the peak.
pub fn compute_drawdown(equity: &[f64]) -> (f64, f64) {
    let Some(&first) = equity.first() else {
        return (0.0, 0.0);
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    let mut max_dd_pct = 0.0_f64;

    for &value in equity {
        if value > peak {
            peak = value;
        }
        let dd = peak - value;
        if dd > max_dd {
            max_dd = dd;
            max_dd_pct = if peak > 0.0 { dd / peak * 100.0 } else { 0.0 };
        }
    }

    (max_dd, max_dd_pct)
}

/// Annualized Sharpe ratio of per-step simple returns, population stddev.
pub fn compute_sharpe(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0], w[1]);
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
