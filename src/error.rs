use thiserror::Error;

#[derive(Error, Debug)]
pub enum GapsError {
    #[error("Missing required column(s): {}", .missing.join(", "))]
    MalformedInput { missing: Vec<String> },

    #[error("Unparsable date in row {row}, column {column}: {value:?}")]
    MalformedDate {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid value in row {row}, column {column}: {value:?}")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, GapsError>;
