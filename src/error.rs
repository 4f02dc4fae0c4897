// src/error.rs
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between reading the configuration and
/// writing the exported chart.
///
/// A worksheet name that is missing from the remote document is not an
/// error: the fetch skips it with a warning and carries on.
#[derive(Debug, Error)]
pub enum Error {
    /// The credential file is missing or malformed, or the service
    /// rejected the credentials.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The document id did not resolve to a spreadsheet.
    #[error("spreadsheet document '{0}' not found")]
    DocumentNotFound(String),

    /// Rate limiting, network trouble or a server-side failure. The caller
    /// may retry; nothing here retries automatically.
    #[error("spreadsheet service unavailable: {0}")]
    TransientService(String),

    /// A cell that was selected for plotting does not parse as a number.
    #[error(
        "cell {cell:?} in worksheet '{worksheet}' (column position {column}, row {row}) \
         is not a number"
    )]
    NumericConversion {
        worksheet: String,
        column: usize,
        row: usize,
        cell: String,
    },

    /// Invalid style options or a drawing-backend failure.
    #[error("render failed: {0}")]
    Render(String),

    /// Unsupported export format or unwritable output path.
    #[error("export failed: {0}")]
    Export(String),

    /// Refresh intervals must be a positive whole number of seconds.
    #[error("refresh interval must be a positive number of seconds, got {0}")]
    InvalidInterval(u64),

    /// Missing or malformed configuration fields.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Anything the other variants do not cover.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}
