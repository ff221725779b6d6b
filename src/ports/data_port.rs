//! Data access port trait.

use crate::domain::candle::{Candle, Timeframe};
use crate::domain::error::SwingtraderError;

pub trait DataPort {
    /// Full candle history for one ticker at one timeframe.
    fn fetch_candles(
        &self,
        ticker: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, SwingtraderError>;
}
