//! Trade blotter CSV adapter implementing ReportPort.

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SwingtraderError;
use crate::domain::position::Trade;
use crate::ports::report_port::ReportPort;

const HEADER: [&str; 11] = [
    "Entry Date",
    "Exit Date",
    "Ticker",
    "Direction",
    "Entry Price",
    "Exit Price",
    "Shares",
    "PnL",
    "PnL %",
    "Days Held",
    "Exit Reason",
];

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct BlotterCsvAdapter;

impl BlotterCsvAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BlotterCsvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn trade_row(trade: &Trade) -> [String; 11] {
    [
        trade.entry_date.format(DATE_FORMAT).to_string(),
        trade.exit_date.format(DATE_FORMAT).to_string(),
        trade.ticker.clone(),
        trade.direction.to_string(),
        format!("{:.2}", trade.entry_price),
        format!("{:.2}", trade.exit_price),
        format!("{:.4}", trade.shares),
        format!("{:.2}", trade.pnl),
        format!("{:.2}", trade.pnl_percent),
        trade.days_held.to_string(),
        trade.exit_reason.to_string(),
    ]
}

fn report_error(e: csv::Error) -> SwingtraderError {
    SwingtraderError::Report {
        reason: format!("blotter write failed: {e}"),
    }
}

impl ReportPort for BlotterCsvAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SwingtraderError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(SwingtraderError::Io)?;
        }

        let mut writer = csv::Writer::from_path(output_path).map_err(report_error)?;
        writer.write_record(HEADER).map_err(report_error)?;
        for trade in &result.trades {
            writer.write_record(trade_row(trade)).map_err(report_error)?;
        }
        writer.flush().map_err(SwingtraderError::Io)?;

        log::info!("blotter saved to {}", output_path.display());
        Ok(())
    }
}
