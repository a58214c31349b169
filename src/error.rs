//! Error types for report generation
//!
//! Failures fall into two kinds that the web layer shows differently:
//! a [`SchemaError`] when required columns are missing (generation is never
//! attempted), and a [`GenerationError`] for anything that goes wrong while
//! reading, typing, aggregating or rendering the data.

use thiserror::Error;

/// Top-level error returned to callers of the report pipeline
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Error al procesar el archivo: {0}")]
    Generation(#[from] GenerationError),
}

impl ReportError {
    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::Schema(_) => "schema",
            ReportError::Generation(_) => "generation",
        }
    }

    /// Missing column names, empty unless this is a schema error
    pub fn missing_columns(&self) -> &[String] {
        match self {
            ReportError::Schema(SchemaError::MissingColumns(missing)) => missing.as_slice(),
            ReportError::Generation(_) => &[],
        }
    }
}

/// One or more required columns are absent from the uploaded table
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error(
        "El archivo no contiene las siguientes columnas requeridas: {}",
        .0.join(", ")
    )]
    MissingColumns(Vec<String>),
}

/// Any failure after the column check passed
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("the dataset has no records, the enrollment period is undefined")]
    EmptyDataset,

    #[error("unreadable file: {0}")]
    Unreadable(String),

    #[error("row {row}, column \"{column}\": {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<calamine::Error> for GenerationError {
    fn from(err: calamine::Error) -> Self {
        GenerationError::Unreadable(err.to_string())
    }
}
