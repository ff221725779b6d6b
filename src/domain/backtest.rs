//! Backtest engine and event loop.
//!
//! One step per unique hourly timestamp, in ascending order:
//! deposit → settlement → exit check → entry check → record.
//! A position still open after the last step is closed at the last price.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use super::candle::candles_up_to;
use super::market_data::MarketData;
use super::metrics::Summary;
use super::portfolio::{AccountState, Portfolio, whole_days_between};
use super::position::{Direction, ExitReason, Position, PositionState, Trade};
use super::signal::{self, SizingRules};

/// Days between scheduled deposits.
pub const DEPOSIT_INTERVAL_DAYS: i64 = 14;

/// When sale proceeds become spendable cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementMode {
    /// Proceeds are spendable immediately.
    TPlus0,
    /// Proceeds sit in unsettled cash until a whole day after the exit.
    TPlus1,
}

impl fmt::Display for SettlementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementMode::TPlus0 => write!(f, "T+0"),
            SettlementMode::TPlus1 => write!(f, "T+1"),
        }
    }
}

impl FromStr for SettlementMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "T+0" => Ok(SettlementMode::TPlus0),
            "T+1" => Ok(SettlementMode::TPlus1),
            other => Err(format!("unknown settlement mode '{other}' (expected T+0 or T+1)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub biweekly_deposit: f64,
    pub bull_etf: String,
    pub bear_etf: String,
    pub enable_pdt_guard: bool,
    pub cash_settlement: SettlementMode,
    pub risk_percent_small: f64,
    pub risk_percent_large: f64,
    pub min_risk_dollar: f64,
    pub max_position_size: f64,
    pub stop_loss_multiplier: f64,
    pub time_stop_days: i64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            biweekly_deposit: 100.0,
            bull_etf: "SPXL".to_string(),
            bear_etf: "SPXS".to_string(),
            enable_pdt_guard: true,
            cash_settlement: SettlementMode::TPlus1,
            risk_percent_small: 2.0,
            risk_percent_large: 1.0,
            min_risk_dollar: 25.0,
            max_position_size: 1_000.0,
            stop_loss_multiplier: 1.5,
            time_stop_days: 10,
        }
    }
}

impl BacktestConfig {
    pub fn sizing_rules(&self) -> SizingRules {
        SizingRules {
            risk_percent_small: self.risk_percent_small,
            risk_percent_large: self.risk_percent_large,
            min_risk_dollar: self.min_risk_dollar,
            max_position_size: self.max_position_size,
        }
    }

    pub fn tickers(&self) -> [&str; 2] {
        [&self.bull_etf, &self.bear_etf]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<AccountState>,
    pub summary: Summary,
}

/// A qualifying entry decision.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySignal {
    pub ticker: String,
    pub direction: Direction,
    pub entry_price: f64,
}

pub fn run_backtest(market: &MarketData, config: &BacktestConfig) -> BacktestResult {
    let timeline = market.timeline(&config.tickers());
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(timeline.len());

    if let (Some(first), Some(last)) = (timeline.first(), timeline.last()) {
        log::info!("starting backtest from {first} to {last}");
        log::info!("initial capital: ${:.2}", config.initial_capital);
    }

    for &now in &timeline {
        apply_deposit(&mut portfolio, config, now);
        settle_cash(&mut portfolio, config, now);
        if let Some(trade) = check_exit(&mut portfolio, market, config, now) {
            trades.push(trade);
        }
        check_entry(&mut portfolio, market, config, now);
        equity_curve.push(record(&portfolio, market, now));
    }

    if let Some(&last) = timeline.last() {
        if let Some(position) = portfolio.state.take() {
            let exit_price = market.price_at(&position.ticker, last);
            trades.push(close_position(
                &mut portfolio,
                config,
                position,
                last,
                exit_price,
                ExitReason::SignalExit,
            ));
        }
    }

    let summary = Summary::compute(&trades, &equity_curve);
    BacktestResult {
        trades,
        equity_curve,
        summary,
    }
}

/// Credit the deposit on the first step and every 14 whole days after the
/// previous deposit.
pub fn apply_deposit(portfolio: &mut Portfolio, config: &BacktestConfig, now: NaiveDateTime) {
    let due = match portfolio.last_deposit {
        None => true,
        Some(last) => whole_days_between(last, now) >= DEPOSIT_INTERVAL_DAYS,
    };
    if due {
        portfolio.cash += config.biweekly_deposit;
        portfolio.last_deposit = Some(now);
        log::debug!("{now}: deposit ${:.2}", config.biweekly_deposit);
    }
}

/// Under T+1, release unsettled proceeds once a whole day has passed since
/// the last exit.
pub fn settle_cash(portfolio: &mut Portfolio, config: &BacktestConfig, now: NaiveDateTime) {
    if config.cash_settlement != SettlementMode::TPlus1 || portfolio.unsettled_cash <= 0.0 {
        return;
    }
    let settled = portfolio
        .last_exit
        .is_some_and(|exit| whole_days_between(exit, now) >= 1);
    if settled {
        log::debug!("{now}: settled ${:.2}", portfolio.unsettled_cash);
        portfolio.cash += portfolio.unsettled_cash;
        portfolio.unsettled_cash = 0.0;
    }
}

/// Exit the open position on a stop-loss or time-stop; otherwise refresh
/// its holding period.
pub fn check_exit(
    portfolio: &mut Portfolio,
    market: &MarketData,
    config: &BacktestConfig,
    now: NaiveDateTime,
) -> Option<Trade> {
    let PositionState::Open(position) = &mut portfolio.state else {
        return None;
    };

    let price = market.price_at(&position.ticker, now);
    position.days_held = whole_days_between(position.entry_date, now);

    let reason = if position.should_stop_loss(price) {
        ExitReason::StopLoss
    } else if position.days_held >= config.time_stop_days {
        ExitReason::TimeStop
    } else {
        return None;
    };

    let position = portfolio.state.take()?;
    let trade = close_position(portfolio, config, position, now, price, reason);
    portfolio.last_exit = Some(now);
    Some(trade)
}

fn close_position(
    portfolio: &mut Portfolio,
    config: &BacktestConfig,
    position: Position,
    now: NaiveDateTime,
    exit_price: f64,
    reason: ExitReason,
) -> Trade {
    let proceeds = position.market_value(exit_price);
    match config.cash_settlement {
        SettlementMode::TPlus1 => portfolio.unsettled_cash += proceeds,
        SettlementMode::TPlus0 => portfolio.cash += proceeds,
    }

    let trade = position.close(now, exit_price, reason);
    log::info!(
        "{now}: CLOSE {} {:.4} {} @ ${:.2}, PnL: ${:.2} ({:.2}%), Reason: {}",
        trade.direction,
        trade.shares,
        trade.ticker,
        trade.exit_price,
        trade.pnl,
        trade.pnl_percent,
        trade.exit_reason,
    );
    trade
}

/// Pattern-day-trading guard: no entry on the same day as the last exit.
pub fn pdt_allows_entry(portfolio: &Portfolio, config: &BacktestConfig, now: NaiveDateTime) -> bool {
    if !config.enable_pdt_guard {
        return true;
    }
    match portfolio.last_exit {
        None => true,
        Some(exit) => whole_days_between(exit, now) > 0,
    }
}

/// Bull ETF first, then bear ETF. The first qualifying signal wins.
pub fn find_entry_signal(
    market: &MarketData,
    config: &BacktestConfig,
    now: NaiveDateTime,
) -> Option<EntrySignal> {
    let candidates = [
        (&config.bull_etf, Direction::Long),
        (&config.bear_etf, Direction::Short),
    ];

    candidates.into_iter().find_map(|(ticker, direction)| {
        let daily = candles_up_to(market.daily(ticker), now);
        let hourly = candles_up_to(market.hourly(ticker), now);

        let trend = signal::check_daily_trend(daily);
        let aligned = match direction {
            Direction::Long => trend.is_bullish,
            Direction::Short => trend.is_bearish,
        };
        if !aligned || !signal::check_hourly_entry(hourly, signal::DEFAULT_PULLBACK_LOOKBACK) {
            return None;
        }

        hourly.last().map(|candle| EntrySignal {
            ticker: ticker.clone(),
            direction,
            entry_price: candle.close,
        })
    })
}

/// Open a position when FLAT, allowed by the PDT guard, and signalled.
/// Returns whether a position was opened.
pub fn check_entry(
    portfolio: &mut Portfolio,
    market: &MarketData,
    config: &BacktestConfig,
    now: NaiveDateTime,
) -> bool {
    if !portfolio.state.is_flat() || !pdt_allows_entry(portfolio, config, now) {
        return false;
    }
    let Some(entry) = find_entry_signal(market, config, now) else {
        return false;
    };

    match build_position(market, config, &entry, portfolio.cash, now) {
        Some(position) => {
            log::info!(
                "{now}: OPEN {} {:.4} {} @ ${:.2}, SL: ${:.2}",
                position.direction,
                position.shares,
                position.ticker,
                position.entry_price,
                position.stop_loss,
            );
            portfolio.cash -= position.cost();
            portfolio.state = PositionState::Open(position);
            true
        }
        None => false,
    }
}

/// Size a position against `available_cash`. `None` when there is no daily
/// history, the size is not positive, or the cost exceeds the cash.
fn build_position(
    market: &MarketData,
    config: &BacktestConfig,
    entry: &EntrySignal,
    available_cash: f64,
    now: NaiveDateTime,
) -> Option<Position> {
    let daily = candles_up_to(market.daily(&entry.ticker), now);
    if daily.is_empty() {
        return None;
    }

    let stop_loss = signal::calculate_stop_loss(
        daily,
        entry.entry_price,
        entry.direction,
        config.stop_loss_multiplier,
    );
    let shares = signal::calculate_position_size(
        available_cash,
        entry.entry_price,
        stop_loss,
        &config.sizing_rules(),
    );

    if shares <= 0.0 || shares * entry.entry_price > available_cash {
        log::debug!(
            "{now}: rejected {} entry on {} ({shares:.4} shares, cash ${available_cash:.2})",
            entry.direction,
            entry.ticker,
        );
        return None;
    }

    Some(Position {
        entry_date: now,
        entry_price: entry.entry_price,
        shares,
        direction: entry.direction,
        ticker: entry.ticker.clone(),
        stop_loss,
        days_held: 0,
    })
}

fn record(portfolio: &Portfolio, market: &MarketData, now: NaiveDateTime) -> AccountState {
    let price = portfolio
        .state
        .position()
        .map(|p| market.price_at(&p.ticker, now))
        .unwrap_or(0.0);
    portfolio.snapshot(now, price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::{Candle, Timeframe};
    use chrono::{Duration, NaiveDate};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn hourly(ticker_closes: &[(NaiveDateTime, f64)]) -> Vec<Candle> {
        ticker_closes
            .iter()
            .map(|&(timestamp, close)| Candle {
                timestamp,
                open: close,
                high: close,
                low: close,
                close,
                volume: 0.0,
            })
            .collect()
    }

    fn open_long(entry: NaiveDateTime, price: f64, shares: f64, stop: f64) -> PositionState {
        PositionState::Open(Position {
            entry_date: entry,
            entry_price: price,
            shares,
            direction: Direction::Long,
            ticker: "SPXL".into(),
            stop_loss: stop,
            days_held: 0,
        })
    }

    fn config() -> BacktestConfig {
        BacktestConfig::default()
    }

    #[test]
    fn settlement_mode_parse_and_display() {
        assert_eq!("T+1".parse::<SettlementMode>(), Ok(SettlementMode::TPlus1));
        assert_eq!(" t+0 ".parse::<SettlementMode>(), Ok(SettlementMode::TPlus0));
        assert!("T+2".parse::<SettlementMode>().is_err());
        assert_eq!(SettlementMode::TPlus1.to_string(), "T+1");
    }

    #[test]
    fn deposit_first_step_then_every_fourteen_days() {
        let mut portfolio = Portfolio::new(1_000.0);
        let cfg = config();

        apply_deposit(&mut portfolio, &cfg, at(1, 10));
        assert!((portfolio.cash - 1_100.0).abs() < 1e-9);

        apply_deposit(&mut portfolio, &cfg, at(15, 9));
        assert!((portfolio.cash - 1_100.0).abs() < 1e-9);

        apply_deposit(&mut portfolio, &cfg, at(15, 10));
        assert!((portfolio.cash - 1_200.0).abs() < 1e-9);
        assert_eq!(portfolio.last_deposit, Some(at(15, 10)));
    }

    #[test]
    fn t_plus_one_settles_after_a_whole_day() {
        let mut portfolio = Portfolio::new(0.0);
        portfolio.unsettled_cash = 500.0;
        portfolio.last_exit = Some(at(2, 15));
        let cfg = config();

        settle_cash(&mut portfolio, &cfg, at(3, 10));
        assert_eq!(portfolio.unsettled_cash, 500.0);

        settle_cash(&mut portfolio, &cfg, at(3, 15));
        assert_eq!(portfolio.unsettled_cash, 0.0);
        assert!((portfolio.cash - 500.0).abs() < 1e-9);
    }

    #[test]
    fn t_plus_zero_never_touches_unsettled() {
        let mut portfolio = Portfolio::new(0.0);
        portfolio.unsettled_cash = 500.0;
        portfolio.last_exit = Some(at(1, 10));
        let cfg = BacktestConfig {
            cash_settlement: SettlementMode::TPlus0,
            ..config()
        };
        settle_cash(&mut portfolio, &cfg, at(9, 10));
        assert_eq!(portfolio.unsettled_cash, 500.0);
    }

    #[test]
    fn stop_loss_exit_credits_unsettled() {
        let market = MarketData::new().with_series(
            "SPXL",
            Timeframe::Hourly,
            hourly(&[(at(2, 10), 100.0), (at(3, 10), 90.0)]),
        );
        let mut portfolio = Portfolio::new(0.0);
        portfolio.state = open_long(at(2, 10), 100.0, 10.0, 95.0);

        let trade = check_exit(&mut portfolio, &market, &config(), at(3, 10)).unwrap();

        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!((trade.pnl - (-100.0)).abs() < 1e-9);
        assert!((trade.pnl_percent - (-10.0)).abs() < 1e-9);
        assert_eq!(trade.days_held, 1);
        assert!(portfolio.state.is_flat());
        assert!((portfolio.unsettled_cash - 900.0).abs() < 1e-9);
        assert_eq!(portfolio.cash, 0.0);
        assert_eq!(portfolio.last_exit, Some(at(3, 10)));
    }

    #[test]
    fn t_plus_zero_exit_credits_cash() {
        let market = MarketData::new().with_series(
            "SPXL",
            Timeframe::Hourly,
            hourly(&[(at(3, 10), 90.0)]),
        );
        let mut portfolio = Portfolio::new(0.0);
        portfolio.state = open_long(at(2, 10), 100.0, 10.0, 95.0);
        let cfg = BacktestConfig {
            cash_settlement: SettlementMode::TPlus0,
            ..config()
        };

        check_exit(&mut portfolio, &market, &cfg, at(3, 10)).unwrap();
        assert!((portfolio.cash - 900.0).abs() < 1e-9);
        assert_eq!(portfolio.unsettled_cash, 0.0);
    }

    #[test]
    fn time_stop_exit() {
        let market = MarketData::new().with_series(
            "SPXL",
            Timeframe::Hourly,
            hourly(&[(at(12, 10), 101.0)]),
        );
        let mut portfolio = Portfolio::new(0.0);
        portfolio.state = open_long(at(2, 10), 100.0, 10.0, 95.0);

        let trade = check_exit(&mut portfolio, &market, &config(), at(12, 10)).unwrap();
        assert_eq!(trade.exit_reason, ExitReason::TimeStop);
        assert_eq!(trade.days_held, 10);
    }

    #[test]
    fn hold_updates_days_held() {
        let market = MarketData::new().with_series(
            "SPXL",
            Timeframe::Hourly,
            hourly(&[(at(5, 11), 101.0)]),
        );
        let mut portfolio = Portfolio::new(0.0);
        portfolio.state = open_long(at(2, 10), 100.0, 10.0, 95.0);

        assert!(check_exit(&mut portfolio, &market, &config(), at(5, 11)).is_none());
        assert_eq!(portfolio.state.position().unwrap().days_held, 3);
    }

    #[test]
    fn short_stop_triggers_on_rise() {
        let market = MarketData::new().with_series(
            "SPXS",
            Timeframe::Hourly,
            hourly(&[(at(3, 10), 106.0)]),
        );
        let mut portfolio = Portfolio::new(0.0);
        portfolio.state = PositionState::Open(Position {
            entry_date: at(2, 10),
            entry_price: 100.0,
            shares: 5.0,
            direction: Direction::Short,
            ticker: "SPXS".into(),
            stop_loss: 105.0,
            days_held: 0,
        });

        let trade = check_exit(&mut portfolio, &market, &config(), at(3, 10)).unwrap();
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!((trade.pnl - (-30.0)).abs() < 1e-9);
    }

    #[test]
    fn flat_portfolio_has_no_exit() {
        let mut portfolio = Portfolio::new(100.0);
        assert!(check_exit(&mut portfolio, &MarketData::new(), &config(), at(1, 10)).is_none());
    }

    #[test]
    fn pdt_guard_blocks_same_day() {
        let mut portfolio = Portfolio::new(0.0);
        let cfg = config();
        assert!(pdt_allows_entry(&portfolio, &cfg, at(1, 10)));

        portfolio.last_exit = Some(at(1, 10));
        assert!(!pdt_allows_entry(&portfolio, &cfg, at(1, 15)));
        assert!(!pdt_allows_entry(&portfolio, &cfg, at(2, 9)));
        assert!(pdt_allows_entry(&portfolio, &cfg, at(2, 10)));

        let off = BacktestConfig {
            enable_pdt_guard: false,
            ..config()
        };
        assert!(pdt_allows_entry(&portfolio, &off, at(1, 15)));
    }

    #[test]
    fn no_data_means_no_signal() {
        assert!(find_entry_signal(&MarketData::new(), &config(), at(1, 10)).is_none());
    }

    #[test]
    fn empty_market_runs_to_empty_result() {
        let result = run_backtest(&MarketData::new(), &config());
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
        assert_eq!(result.summary.total_trades, 0);
    }

    #[test]
    fn flat_run_records_one_state_per_timestamp() {
        let stamps: Vec<(NaiveDateTime, f64)> = (0..30)
            .map(|i| (at(1, 0) + Duration::hours(i * 7), 50.0))
            .collect();
        let market = MarketData::new()
            .with_series("SPXL", Timeframe::Hourly, hourly(&stamps))
            .with_series("SPXS", Timeframe::Hourly, hourly(&stamps[..10]));
        let cfg = BacktestConfig {
            biweekly_deposit: 0.0,
            ..config()
        };

        let result = run_backtest(&market, &cfg);
        assert_eq!(result.equity_curve.len(), 30);
        for state in &result.equity_curve {
            assert!((state.equity - 10_000.0).abs() < 1e-9);
            assert!(state.position.is_none());
        }
    }
}
