//! CSV file data adapter.
//!
//! Reads `<TICKER>_D1.csv` and `<TICKER>_H1.csv` from a base directory.

use crate::domain::candle::{self, Candle, Timeframe};
use crate::domain::error::SwingtraderError;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_COLUMNS: [&str; 3] = ["timestamp", "date", "time"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, SwingtraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| SwingtraderError::Data {
                reason: format!("missing {name} column"),
            })
        };

        let timestamp = TIMESTAMP_COLUMNS
            .iter()
            .find_map(|&name| find(name))
            .ok_or_else(|| SwingtraderError::Data {
                reason: "missing timestamp column".into(),
            })?;

        Ok(Columns {
            timestamp,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, ticker: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", ticker, timeframe.suffix()))
    }
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]` and RFC 3339.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_field(record: &StringRecord, index: usize, name: &str) -> Result<f64, SwingtraderError> {
    let value = record
        .get(index)
        .ok_or_else(|| SwingtraderError::Data {
            reason: format!("missing {name} value"),
        })?
        .trim()
        .parse::<f64>()
        .map_err(|e| SwingtraderError::Data {
            reason: format!("invalid {name} value: {e}"),
        })?;
    if !value.is_finite() {
        return Err(SwingtraderError::Data {
            reason: format!("non-finite {name} value: {value}"),
        });
    }
    Ok(value)
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        ticker: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, SwingtraderError> {
        let path = self.csv_path(ticker, timeframe);
        if !path.exists() {
            return Err(SwingtraderError::NoData {
                ticker: ticker.to_string(),
                timeframe: timeframe.to_string(),
            });
        }
        let content = fs::read_to_string(&path).map_err(|e| SwingtraderError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SwingtraderError::Data {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let columns = Columns::from_headers(headers)?;
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| SwingtraderError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let raw = record.get(columns.timestamp).unwrap_or_default();
            let timestamp = parse_timestamp(raw).ok_or_else(|| SwingtraderError::Data {
                reason: format!("invalid timestamp '{raw}'"),
            })?;

            let volume = match columns.volume {
                Some(index) => parse_field(&record, index, "volume")?,
                None => 0.0,
            };

            candles.push(Candle {
                timestamp,
                open: parse_field(&record, columns.open, "open")?,
                high: parse_field(&record, columns.high, "high")?,
                low: parse_field(&record, columns.low, "low")?,
                close: parse_field(&record, columns.close, "close")?,
                volume,
            });
        }

        candle::normalize(&mut candles);
        Ok(candles)
    }
}
