//! Technical indicators driving the trend filter and entry trigger.
//!
//! Every indicator returns one element per input element. Elements that do
//! not yet have enough history are `None`; arithmetic never sees a sentinel
//! value. All functions are total over any finite input.

pub mod ema;
pub mod atr;
pub mod adx;
pub mod trend;

pub use adx::adx;
pub use atr::atr;
pub use ema::ema;
pub use trend::is_rising;

/// An indicator series aligned index-for-index with its input.
pub type Series = Vec<Option<f64>>;

/// Value at the last index, flattening "no data" and "undefined".
pub fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}
