use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Unknown sheet '{name}' (available: {})", .available.join(", "))]
    UnknownSheet { name: String, available: Vec<String> },

    #[error("Sheet has no header row")]
    EmptySheet,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Row {row}: field '{column}' is missing")]
    MissingField { row: usize, column: String },

    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MetricsError>;
