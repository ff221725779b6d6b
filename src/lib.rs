//! swingtrader: trend-following swing-trading backtester.
//!
//! Hexagonal architecture: simulation logic in [`domain`], collaborator traits
//! in [`ports`], concrete file I/O in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
