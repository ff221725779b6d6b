//! Core domain types and the simulation core.

pub mod candle;
pub mod indicator;
pub mod signal;
pub mod position;
pub mod portfolio;
pub mod market_data;
pub mod backtest;
pub mod metrics;
pub mod config_validation;
pub mod error;
