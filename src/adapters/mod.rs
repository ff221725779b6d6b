//! Concrete adapter implementations for ports.

pub mod blotter_csv_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod summary_json_adapter;
