//! Candle representation and series lookups.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Granularity of a candle series. Daily drives the trend filter, hourly
/// drives entry triggers, marking and exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    Daily,
    Hourly,
}

impl Timeframe {
    /// File suffix used by the CSV loader.
    pub fn suffix(self) -> &'static str {
        match self {
            Timeframe::Daily => "D1",
            Timeframe::Hourly => "H1",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Daily => write!(f, "daily"),
            Timeframe::Hourly => write!(f, "hourly"),
        }
    }
}

/// Prefix of `candles` with `timestamp <= at`. Assumes ascending order.
pub fn candles_up_to(candles: &[Candle], at: NaiveDateTime) -> &[Candle] {
    let end = candles.partition_point(|c| c.timestamp <= at);
    &candles[..end]
}

/// Close of the candle at `at`, else of the nearest preceding candle.
pub fn close_at_or_before(candles: &[Candle], at: NaiveDateTime) -> Option<f64> {
    candles_up_to(candles, at).last().map(|c| c.close)
}

/// Sort ascending and drop later duplicates of the same timestamp.
pub fn normalize(candles: &mut Vec<Candle>) {
    candles.sort_by_key(|c| c.timestamp);
    candles.dedup_by_key(|c| c.timestamp);
}
