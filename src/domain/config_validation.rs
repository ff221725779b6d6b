//! Configuration validation and construction of [`BacktestConfig`].
//!
//! Every key is optional and falls back to the run defaults; present values
//! must be in range before a backtest runs.

use crate::domain::backtest::{BacktestConfig, SettlementMode};
use crate::domain::error::SwingtraderError;
use crate::ports::config_port::ConfigPort;

const BACKTEST: &str = "backtest";
const RISK: &str = "risk";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    validate_initial_capital(config)?;
    validate_deposit(config)?;
    validate_tickers(config)?;
    parse_settlement(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    let defaults = BacktestConfig::default();

    for (key, default) in [
        ("risk_percent_small", defaults.risk_percent_small),
        ("risk_percent_large", defaults.risk_percent_large),
    ] {
        let value = config.get_double(RISK, key, default);
        if value <= 0.0 || value > 100.0 {
            return Err(invalid(RISK, key, "must be in (0, 100]"));
        }
    }

    if config.get_double(RISK, "min_risk_dollar", defaults.min_risk_dollar) < 0.0 {
        return Err(invalid(RISK, "min_risk_dollar", "must be non-negative"));
    }
    if config.get_double(RISK, "max_position_size", defaults.max_position_size) <= 0.0 {
        return Err(invalid(RISK, "max_position_size", "must be positive"));
    }
    if config.get_double(RISK, "stop_loss_multiplier", defaults.stop_loss_multiplier) <= 0.0 {
        return Err(invalid(RISK, "stop_loss_multiplier", "must be positive"));
    }
    if config.get_int(RISK, "time_stop_days", defaults.time_stop_days) < 1 {
        return Err(invalid(RISK, "time_stop_days", "must be at least 1"));
    }
    Ok(())
}

/// Validate both sections and assemble the run parameters.
pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SwingtraderError> {
    validate_backtest_config(config)?;
    validate_risk_config(config)?;

    let d = BacktestConfig::default();
    Ok(BacktestConfig {
        initial_capital: config.get_double(BACKTEST, "initial_capital", d.initial_capital),
        biweekly_deposit: config.get_double(BACKTEST, "biweekly_deposit", d.biweekly_deposit),
        bull_etf: ticker(config, "bull_etf", &d.bull_etf),
        bear_etf: ticker(config, "bear_etf", &d.bear_etf),
        enable_pdt_guard: config.get_bool(BACKTEST, "enable_pdt_guard", d.enable_pdt_guard),
        cash_settlement: parse_settlement(config)?,
        risk_percent_small: config.get_double(RISK, "risk_percent_small", d.risk_percent_small),
        risk_percent_large: config.get_double(RISK, "risk_percent_large", d.risk_percent_large),
        min_risk_dollar: config.get_double(RISK, "min_risk_dollar", d.min_risk_dollar),
        max_position_size: config.get_double(RISK, "max_position_size", d.max_position_size),
        stop_loss_multiplier: config.get_double(
            RISK,
            "stop_loss_multiplier",
            d.stop_loss_multiplier,
        ),
        time_stop_days: config.get_int(RISK, "time_stop_days", d.time_stop_days),
    })
}

fn invalid(section: &str, key: &str, reason: &str) -> SwingtraderError {
    SwingtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn ticker(config: &dyn ConfigPort, key: &str, default: &str) -> String {
    config
        .get_string(BACKTEST, key)
        .map(|s| s.trim().to_uppercase())
        .unwrap_or_else(|| default.to_string())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    let default = BacktestConfig::default().initial_capital;
    if config.get_double(BACKTEST, "initial_capital", default) <= 0.0 {
        return Err(invalid(BACKTEST, "initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_deposit(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    let default = BacktestConfig::default().biweekly_deposit;
    if config.get_double(BACKTEST, "biweekly_deposit", default) < 0.0 {
        return Err(invalid(BACKTEST, "biweekly_deposit", "biweekly_deposit must be non-negative"));
    }
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), SwingtraderError> {
    let defaults = BacktestConfig::default();
    let bull = ticker(config, "bull_etf", &defaults.bull_etf);
    let bear = ticker(config, "bear_etf", &defaults.bear_etf);

    if bull.is_empty() {
        return Err(invalid(BACKTEST, "bull_etf", "ticker must not be empty"));
    }
    if bear.is_empty() {
        return Err(invalid(BACKTEST, "bear_etf", "ticker must not be empty"));
    }
    if bull == bear {
        return Err(invalid(BACKTEST, "bear_etf", "bull_etf and bear_etf must differ"));
    }
    Ok(())
}

fn parse_settlement(config: &dyn ConfigPort) -> Result<SettlementMode, SwingtraderError> {
    match config.get_string(BACKTEST, "cash_settlement") {
        None => Ok(BacktestConfig::default().cash_settlement),
        Some(s) => s
            .parse()
            .map_err(|reason: String| invalid(BACKTEST, "cash_settlement", &reason)),
    }
}
