//! Average True Range.
//!
//! True range of the first bar is high - low; later bars use the full
//! three-way true range. The TR series is smoothed with [`ema`].

use super::{Series, ema};
use crate::domain::candle::Candle;

/// Per-bar true range, same length as `candles`.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(candles[i - 1].close)
            }
        })
        .collect()
}

pub fn atr(candles: &[Candle], period: usize) -> Series {
    ema(&true_ranges(candles), period)
}
