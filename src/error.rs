use thiserror::Error;

/// Errors that can abort a conversion run.
///
/// Only structural problems are fatal: a survey file we cannot read, or a
/// header row that lacks the columns the converter needs. Per-cell anomalies
/// (empty cells, headers that merely look like availability columns) are
/// absorbed during parsing and never surface here.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// A required column was not found in the header row.
    #[error("Required column not found: {wanted}")]
    MissingColumn { wanted: String },

    /// The CSV reader failed at the file/record level.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// An underlying I/O failure while reading input or writing artifacts.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ConvertResult<T> = Result<T, ConvertError>;
