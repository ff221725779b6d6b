//! Trend direction detection over an indicator series.

/// `true` at index `i` only when each of the `lookback` steps ending at `i`
/// is strictly increasing. Steps touching an undefined element are not
/// increasing. Indices below `lookback` are always `false`.
pub fn is_rising(values: &[Option<f64>], lookback: usize) -> Vec<bool> {
    (0..values.len())
        .map(|i| {
            if i < lookback || values[i].is_none() {
                return false;
            }
            (1..=lookback).all(|j| match (values[i - j], values[i - j + 1]) {
                (Some(prev), Some(curr)) => curr > prev,
                _ => false,
            })
        })
        .collect()
}
