//! ADX (Average Directional Index).
//!
//! Steps:
//! 1. +DM, -DM and TR from each pair of consecutive bars
//! 2. Smooth +DM, -DM and TR with [`ema`]
//! 3. +DI / -DI = 100 * smoothed DM / smoothed TR (0 while TR is 0 or undefined)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI) (0 when the sum is 0)
//! 5. ADX = EMA of DX
//!
//! DM/DI/DX series start at the second bar, so the result is prefixed with
//! one undefined element to line up with `candles`.

use super::{Series, ema};
use crate::domain::candle::Candle;

pub const DEFAULT_PERIOD: usize = 14;

/// Directional movement for one bar: (+DM, -DM).
///
/// A move counts only if it is positive and strictly larger than the
/// opposing move.
fn directional_movement(prev: &Candle, curr: &Candle) -> (f64, f64) {
    let up = curr.high - prev.high;
    let down = prev.low - curr.low;
    let plus = if up > down && up > 0.0 { up } else { 0.0 };
    let minus = if down > up && down > 0.0 { down } else { 0.0 };
    (plus, minus)
}

pub fn adx(candles: &[Candle], period: usize) -> Series {
    if candles.is_empty() {
        return Vec::new();
    }

    let steps = candles.len() - 1;
    let mut plus_dm = Vec::with_capacity(steps);
    let mut minus_dm = Vec::with_capacity(steps);
    let mut tr = Vec::with_capacity(steps);

    for pair in candles.windows(2) {
        let (plus, minus) = directional_movement(&pair[0], &pair[1]);
        plus_dm.push(plus);
        minus_dm.push(minus);
        tr.push(pair[1].true_range(pair[0].close));
    }

    let smooth_plus = ema(&plus_dm, period);
    let smooth_minus = ema(&minus_dm, period);
    let smooth_tr = ema(&tr, period);

    let dx: Vec<f64> = (0..steps)
        .map(|i| {
            let (plus_di, minus_di) = match (smooth_plus[i], smooth_minus[i], smooth_tr[i]) {
                (Some(p), Some(m), Some(t)) if t != 0.0 => (p / t * 100.0, m / t * 100.0),
                _ => (0.0, 0.0),
            };
            let sum = plus_di + minus_di;
            if sum == 0.0 {
                0.0
            } else {
                (plus_di - minus_di).abs() / sum * 100.0
            }
        })
        .collect();

    let mut out = Vec::with_capacity(candles.len());
    out.push(None);
    out.extend(ema(&dx, period));
    out
}
