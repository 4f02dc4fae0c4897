// src/data_types.rs
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::Error;

/// Raw worksheet columns keyed by worksheet name.
///
/// Each entry holds the retrieved columns in the order they were requested;
/// a column's first cell is its header. Only worksheets that actually exist
/// in the remote document appear as keys.
pub type RawSheetData = BTreeMap<String, Vec<Vec<String>>>;

/// Identifies one plotted series within a single render pass.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SeriesKey {
    pub worksheet: String,
    /// Position of the x column within the retrieved columns (0-based).
    pub x_index: usize,
    /// Position of the y column within the retrieved columns (0-based).
    pub y_index: usize,
}

/// Paired numeric points for one (worksheet, x, y) combination, sorted
/// ascending by x.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSeries {
    pub key: SeriesKey,
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// How cells are turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoercionPolicy {
    /// Drop blank cells per column before pairing; non-blank cells that do
    /// not parse still fail.
    #[default]
    SkipBlanks,
    /// Every cell must parse, blanks included.
    Strict,
}

/// Rendering primitive applied to every series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphType {
    #[default]
    Line,
    Bar,
    Scatter,
}

impl FromStr for GraphType {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        match text.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(GraphType::Line),
            "bar" => Ok(GraphType::Bar),
            "scatter" => Ok(GraphType::Scatter),
            other => Err(Error::Configuration(format!(
                "unrecognized graph type '{other}', expected line, bar or scatter"
            ))),
        }
    }
}

/// File format a chart can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Svg => "svg",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Error> {
        match text.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "pdf" => Ok(ExportFormat::Pdf),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(Error::Export(format!("unsupported export format '{other}'"))),
        }
    }
}
