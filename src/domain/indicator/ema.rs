//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = (x[i] - EMA[i-1]) * k + EMA[i-1].
//! Warmup: the first (n-1) values are undefined.

use super::Series;

pub fn ema(values: &[f64], period: usize) -> Series {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);

    for (i, &x) in values.iter().enumerate().skip(period) {
        current = (x - current) * k + current;
        out[i] = Some(current);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_warmup() {
        let series = ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        assert_eq!(series.len(), 5);
        assert!(series[0].is_none());
        assert!(series[1].is_none());
        assert!(series[2].is_some());
        assert!(series[3].is_some());
        assert!(series[4].is_some());
    }

    #[test]
    fn ema_period_1_tracks_input() {
        let series = ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(series, vec![Some(10.0), Some(20.0), Some(30.0)]);
    }

    #[test]
    fn ema_seed_is_sma() {
        let series = ema(&[10.0, 20.0, 30.0], 3);
        let seed = series[2].unwrap();
        assert!((seed - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);

        let k = 2.0 / 4.0;
        let sma = 20.0;
        let ema_3 = (40.0 - sma) * k + sma;
        let ema_4 = (50.0 - ema_3) * k + ema_3;

        assert!((series[3].unwrap() - ema_3).abs() < 1e-12);
        assert!((series[4].unwrap() - ema_4).abs() < 1e-12);
    }

    #[test]
    fn ema_constant_input() {
        let series = ema(&[100.0; 8], 3);
        for v in series.iter().skip(2) {
            assert!((v.unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_shorter_than_period_is_all_undefined() {
        let series = ema(&[1.0, 2.0], 5);
        assert_eq!(series, vec![None, None]);
    }

    #[test]
    fn ema_empty_input() {
        assert!(ema(&[], 3).is_empty());
    }

    #[test]
    fn ema_period_0_is_all_undefined() {
        assert_eq!(ema(&[10.0, 20.0], 0), vec![None, None]);
    }
}
