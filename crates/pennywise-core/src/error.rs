//! Error types for Pennywise

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Model not trained yet")]
    ModelNotTrained,

    #[error("Cannot fit a model on an empty feature table")]
    EmptyTrainingSet,

    #[error("Column mismatch: model trained on {expected:?}, got {actual:?}")]
    ColumnMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
