//! Per-ticker daily/hourly candle series and the unified hourly timeline.

use crate::domain::candle::{self, Candle, Timeframe};
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct MarketData {
    daily: HashMap<String, Vec<Candle>>,
    hourly: HashMap<String, Vec<Candle>>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a series, sorting it and removing duplicate timestamps.
    pub fn insert(&mut self, ticker: &str, timeframe: Timeframe, mut candles: Vec<Candle>) {
        candle::normalize(&mut candles);
        let map = match timeframe {
            Timeframe::Daily => &mut self.daily,
            Timeframe::Hourly => &mut self.hourly,
        };
        map.insert(ticker.to_string(), candles);
    }

    pub fn with_series(mut self, ticker: &str, timeframe: Timeframe, candles: Vec<Candle>) -> Self {
        self.insert(ticker, timeframe, candles);
        self
    }

    /// Series for a ticker; empty when it was never loaded.
    pub fn series(&self, ticker: &str, timeframe: Timeframe) -> &[Candle] {
        let map = match timeframe {
            Timeframe::Daily => &self.daily,
            Timeframe::Hourly => &self.hourly,
        };
        map.get(ticker).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn daily(&self, ticker: &str) -> &[Candle] {
        self.series(ticker, Timeframe::Daily)
    }

    pub fn hourly(&self, ticker: &str) -> &[Candle] {
        self.series(ticker, Timeframe::Hourly)
    }

    /// Hourly close at `at`, falling back to the nearest preceding candle,
    /// or 0 when nothing precedes.
    pub fn price_at(&self, ticker: &str, at: NaiveDateTime) -> f64 {
        candle::close_at_or_before(self.hourly(ticker), at).unwrap_or(0.0)
    }

    /// Ascending unique hourly timestamps across `tickers`.
    pub fn timeline(&self, tickers: &[&str]) -> Vec<NaiveDateTime> {
        let unique: BTreeSet<NaiveDateTime> = tickers
            .iter()
            .flat_map(|t| self.hourly(t).iter().map(|c| c.timestamp))
            .collect();
        unique.into_iter().collect()
    }
}

/// Load both timeframes for every ticker. A series that fails to load is
/// logged and left empty so the run degrades to "no signal" for it.
pub fn load_market_data(port: &dyn DataPort, tickers: &[&str]) -> MarketData {
    let mut market = MarketData::new();
    for &ticker in tickers {
        for timeframe in [Timeframe::Daily, Timeframe::Hourly] {
            match port.fetch_candles(ticker, timeframe) {
                Ok(candles) => {
                    log::info!("loaded {ticker}: {} {timeframe} candles", candles.len());
                    market.insert(ticker, timeframe, candles);
                }
                Err(e) => log::warn!("skipping {timeframe} data for {ticker} ({e})"),
            }
        }
    }
    market
}
