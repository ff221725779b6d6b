//! Signal evaluation: daily trend filter, hourly pullback-reclaim trigger,
//! ATR stop placement and risk-based position sizing.

use crate::domain::candle::Candle;
use crate::domain::indicator::{self, adx, atr, ema, is_rising};
use crate::domain::position::Direction;

/// Minimum daily history before the trend filter can fire.
pub const MIN_DAILY_CANDLES: usize = 200;
/// EMA period of the hourly trigger.
pub const HOURLY_EMA_PERIOD: usize = 20;
/// Bars scanned backwards for a pullback below the hourly EMA.
pub const DEFAULT_PULLBACK_LOOKBACK: usize = 20;
pub const MIN_ADX: f64 = 20.0;
pub const ATR_PERIOD: usize = 14;
pub const RISING_LOOKBACK: usize = 3;
/// Fraction of capital a position may use.
pub const CAPITAL_UTILIZATION: f64 = 0.95;
/// Notional below which the small-position risk tier applies.
pub const SMALL_POSITION_NOTIONAL: f64 = 1000.0;
/// Stop distance as a fraction of entry price when ATR is undefined.
pub const FALLBACK_STOP_PCT: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrendSignal {
    pub is_bullish: bool,
    pub is_bearish: bool,
    pub ema20: Option<f64>,
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub adx: Option<f64>,
}

/// Daily trend filter evaluated at the last candle.
///
/// Bullish: EMA20 > EMA50 > EMA200, all three rising, ADX >= 20.
/// Bearish: EMA20 < EMA50 < EMA200, none of the three rising, ADX >= 20.
pub fn check_daily_trend(daily: &[Candle]) -> TrendSignal {
    if daily.len() < MIN_DAILY_CANDLES {
        return TrendSignal::default();
    }

    let closes: Vec<f64> = daily.iter().map(|c| c.close).collect();
    let ema20 = ema(&closes, 20);
    let ema50 = ema(&closes, 50);
    let ema200 = ema(&closes, 200);
    let strength_series = adx(daily, adx::DEFAULT_PERIOD);

    let last = daily.len() - 1;
    let rising = [&ema20, &ema50, &ema200].map(|s| is_rising(s, RISING_LOOKBACK)[last]);

    let (e20, e50, e200, strength) = (ema20[last], ema50[last], ema200[last], strength_series[last]);
    let trending = strength.is_some_and(|a| a >= MIN_ADX);

    let (is_bullish, is_bearish) = match (e20, e50, e200) {
        (Some(fast), Some(mid), Some(slow)) => (
            fast > mid && mid > slow && rising.iter().all(|&r| r) && trending,
            fast < mid && mid < slow && rising.iter().all(|&r| !r) && trending,
        ),
        _ => (false, false),
    };

    TrendSignal {
        is_bullish,
        is_bearish,
        ema20: e20,
        ema50: e50,
        ema200: e200,
        adx: strength,
    }
}

/// Hourly entry trigger: the latest close is above its EMA20 and at least
/// one of the previous `lookback` bars closed below its own EMA20.
pub fn check_hourly_entry(hourly: &[Candle], lookback: usize) -> bool {
    if hourly.len() < HOURLY_EMA_PERIOD + lookback {
        return false;
    }

    let closes: Vec<f64> = hourly.iter().map(|c| c.close).collect();
    let ema20 = ema(&closes, HOURLY_EMA_PERIOD);

    let last = hourly.len() - 1;
    match ema20[last] {
        Some(current) if closes[last] > current => {}
        _ => return false,
    }

    (1..=lookback.min(last)).any(|i| {
        let idx = last - i;
        ema20[idx].is_some_and(|e| closes[idx] < e)
    })
}

/// Stop price `multiplier` daily ATRs away from entry, or 2% away when the
/// ATR is undefined.
pub fn calculate_stop_loss(
    daily: &[Candle],
    entry_price: f64,
    direction: Direction,
    atr_multiplier: f64,
) -> f64 {
    let distance = match indicator::last_value(&atr(daily, ATR_PERIOD)) {
        Some(current_atr) => current_atr * atr_multiplier,
        None => entry_price * FALLBACK_STOP_PCT,
    };

    match direction {
        Direction::Long => entry_price - distance,
        Direction::Short => entry_price + distance,
    }
}

/// Risk-based sizing limits for [`calculate_position_size`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingRules {
    pub risk_percent_small: f64,
    pub risk_percent_large: f64,
    pub min_risk_dollar: f64,
    pub max_position_size: f64,
}

/// Shares to buy so that a stop-out loses the risk budget, capped by
/// available capital and the maximum position notional. Returns 0 when
/// entry equals the stop.
pub fn calculate_position_size(
    capital: f64,
    entry_price: f64,
    stop_loss: f64,
    rules: &SizingRules,
) -> f64 {
    let usable = capital * CAPITAL_UTILIZATION;
    let candidate_notional = usable.min(rules.max_position_size);

    let risk_percent = if candidate_notional < SMALL_POSITION_NOTIONAL {
        rules.risk_percent_small
    } else {
        rules.risk_percent_large
    };
    let risk_budget = (capital * risk_percent / 100.0).max(rules.min_risk_dollar);

    let price_risk = (entry_price - stop_loss).abs();
    if price_risk == 0.0 {
        return 0.0;
    }

    let shares = risk_budget / price_risk;
    let max_shares = (usable / entry_price).min(rules.max_position_size / entry_price);
    shares.min(max_shares)
}
