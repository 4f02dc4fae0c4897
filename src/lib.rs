// src/lib.rs
//! Fetches tabular data from Google Sheets, turns selected columns into
//! numeric series and renders them as line, bar or scatter charts that can
//! be refreshed on a timer and exported to PNG, PDF or SVG.

pub mod chart;
pub mod cloud_handler;
pub mod config;
pub mod data_types;
pub mod error;
pub mod export;
pub mod scheduler;
pub mod series;

pub use chart::{render, ChartSurface};
pub use cloud_handler::CloudHandler;
pub use config::{load_config, AppConfig, PlotSettings, Settings};
pub use data_types::{
    CoercionPolicy, ExportFormat, GraphType, NumericSeries, RawSheetData, SeriesKey,
};
pub use error::{Error, Result};
pub use export::save;
pub use scheduler::RefreshScheduler;
pub use series::build_series;
