//! Structured results document: summary, trade log and equity curve as JSON.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::SwingtraderError;
use crate::domain::metrics::Summary;
use crate::domain::portfolio::AccountState;
use crate::domain::position::Trade;
use crate::ports::report_port::ReportPort;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultsDocument<'a> {
    summary: &'a Summary,
    trades: &'a [Trade],
    equity_curve: &'a [AccountState],
}

pub struct SummaryJsonAdapter;

impl SummaryJsonAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SummaryJsonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_json(result: &BacktestResult) -> Result<String, SwingtraderError> {
    let document = ResultsDocument {
        summary: &result.summary,
        trades: &result.trades,
        equity_curve: &result.equity_curve,
    };
    serde_json::to_string_pretty(&document).map_err(|e| SwingtraderError::Report {
        reason: format!("summary serialization failed: {e}"),
    })
}

impl ReportPort for SummaryJsonAdapter {
    fn write(&self, result: &BacktestResult, output_path: &Path) -> Result<(), SwingtraderError> {
        let json = render_json(result)?;
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(SwingtraderError::Io)?;
        }
        fs::write(output_path, json).map_err(SwingtraderError::Io)?;

        log::info!("summary saved to {}", output_path.display());
        Ok(())
    }
}
