use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema violation: {0}")]
    Schema(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
