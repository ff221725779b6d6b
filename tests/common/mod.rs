#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
pub use swingtrader::domain::backtest::BacktestConfig;
pub use swingtrader::domain::candle::{Candle, Timeframe};
use swingtrader::domain::error::SwingtraderError;
use swingtrader::domain::market_data::MarketData;
use swingtrader::ports::data_port::DataPort;

pub const BULL: &str = "SPXL";
pub const BEAR: &str = "SPXS";

/// First day with hourly data; the daily trend is established by then.
pub const HOURLY_FIRST_DAY: i64 = 205;
pub const HOURLY_DAYS: i64 = 35;
pub const BARS_PER_DAY: i64 = 7;

pub struct MockDataPort {
    pub data: HashMap<(String, Timeframe), Vec<Candle>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, ticker: &str, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        self.data.insert((ticker.to_string(), timeframe), candles);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        ticker: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, SwingtraderError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(SwingtraderError::Data {
                reason: reason.clone(),
            });
        }
        self.data
            .get(&(ticker.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| SwingtraderError::NoData {
                ticker: ticker.to_string(),
                timeframe: timeframe.to_string(),
            })
    }
}

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2023, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn candle(timestamp: NaiveDateTime, close: f64) -> Candle {
    Candle {
        timestamp,
        open: close,
        high: close * 1.01,
        low: close * 0.99,
        close,
        volume: 1000.0,
    }
}

/// Daily candles at midnight, close compounding by `ratio` per bar.
pub fn daily_series(count: usize, ratio: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            candle(
                base_time() + Duration::days(i as i64),
                100.0 * ratio.powi(i as i32),
            )
        })
        .collect()
}

/// Hourly candles 10:00-16:00 on `days` consecutive days from `first_day`.
/// Closes drift up 0.1 per bar with a 3-point dip every tenth bar, so the
/// pullback-reclaim trigger fires repeatedly once enough bars exist.
pub fn hourly_series(first_day: i64, days: i64) -> Vec<Candle> {
    let mut candles = Vec::new();
    let mut i = 0;
    for day in first_day..first_day + days {
        for hour in 0..BARS_PER_DAY {
            let timestamp = base_time() + Duration::days(day) + Duration::hours(10 + hour);
            let base = 100.0 + 0.1 * i as f64;
            let close = if i % 10 == 5 { base - 3.0 } else { base };
            candles.push(candle(timestamp, close));
            i += 1;
        }
    }
    candles
}

pub fn flat_hourly_series(first_day: i64, days: i64, price: f64) -> Vec<Candle> {
    let mut candles = Vec::new();
    for day in first_day..first_day + days {
        for hour in 0..BARS_PER_DAY {
            let timestamp = base_time() + Duration::days(day) + Duration::hours(10 + hour);
            candles.push(candle(timestamp, price));
        }
    }
    candles
}

pub fn daily_count() -> usize {
    (HOURLY_FIRST_DAY + HOURLY_DAYS) as usize
}

/// Bull ETF trending up with repeated hourly triggers; bear ETF absent.
pub fn bull_market() -> MarketData {
    MarketData::new()
        .with_series(BULL, Timeframe::Daily, daily_series(daily_count(), 1.01))
        .with_series(BULL, Timeframe::Hourly, hourly_series(HOURLY_FIRST_DAY, HOURLY_DAYS))
}

/// Bear ETF trending down with hourly triggers; bull ETF has hourly data but
/// no daily history.
pub fn bear_market() -> MarketData {
    MarketData::new()
        .with_series(BULL, Timeframe::Hourly, hourly_series(HOURLY_FIRST_DAY, HOURLY_DAYS))
        .with_series(BEAR, Timeframe::Daily, daily_series(daily_count(), 0.99))
        .with_series(BEAR, Timeframe::Hourly, hourly_series(HOURLY_FIRST_DAY, HOURLY_DAYS))
}

/// Both ETFs qualify at the same timestamps.
pub fn both_markets() -> MarketData {
    MarketData::new()
        .with_series(BULL, Timeframe::Daily, daily_series(daily_count(), 1.01))
        .with_series(BULL, Timeframe::Hourly, hourly_series(HOURLY_FIRST_DAY, HOURLY_DAYS))
        .with_series(BEAR, Timeframe::Daily, daily_series(daily_count(), 0.99))
        .with_series(BEAR, Timeframe::Hourly, hourly_series(HOURLY_FIRST_DAY, HOURLY_DAYS))
}

/// Flat prices everywhere: no signal can ever fire.
pub fn quiet_market() -> MarketData {
    MarketData::new()
        .with_series(BULL, Timeframe::Daily, daily_series(daily_count(), 1.0))
        .with_series(BULL, Timeframe::Hourly, flat_hourly_series(HOURLY_FIRST_DAY, HOURLY_DAYS, 50.0))
        .with_series(BEAR, Timeframe::Daily, daily_series(daily_count(), 1.0))
        .with_series(BEAR, Timeframe::Hourly, flat_hourly_series(HOURLY_FIRST_DAY, HOURLY_DAYS, 50.0))
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig::default()
}

pub fn mock_port_for(market: &MarketData) -> MockDataPort {
    let mut port = MockDataPort::new();
    for ticker in [BULL, BEAR] {
        for timeframe in [Timeframe::Daily, Timeframe::Hourly] {
            let series = market.series(ticker, timeframe);
            if !series.is_empty() {
                port = port.with_candles(ticker, timeframe, series.to_vec());
            }
        }
    }
    port
}
