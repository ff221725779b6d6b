//! Error types for the collaborator layer.
//!
//! The simulation core is total and never fails; only configuration loading,
//! data loading and report writing surface these errors.

/// Top-level error type for swingtrader.
#[derive(Debug, thiserror::Error)]
pub enum SwingtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no {timeframe} data for {ticker}")]
    NoData { ticker: String, timeframe: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SwingtraderError> for std::process::ExitCode {
    fn from(err: &SwingtraderError) -> Self {
        let code: u8 = match err {
            SwingtraderError::Io(_) => 1,
            SwingtraderError::ConfigParse { .. } | SwingtraderError::ConfigInvalid { .. } => 2,
            SwingtraderError::Data { .. } | SwingtraderError::NoData { .. } => 5,
            SwingtraderError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
