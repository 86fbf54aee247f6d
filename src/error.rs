use thiserror::Error;

/// Failures while converting configuration strings into the closed enums of the domain
/// (model types, run modes, cluster run conditions, ...).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Unknown model type: {0}")]
    UnknownModelType(String),

    #[error("Unknown run mode: {0}")]
    UnknownRunMode(String),

    #[error("Unknown cycle mode: {0}")]
    UnknownCycleMode(String),

    #[error("Unknown cluster run condition: {0}")]
    UnknownRunCondition(String),

    #[error("Invalid cycle string '{0}', expected e.g. 20240101_00z")]
    InvalidCycleString(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    #[error(transparent)]
    ConversionError(#[from] ConversionError),

    #[error("Pre-processing of model {model} failed: {reason}")]
    PreProcessError { model: String, reason: String },

    #[error("Execution backend failed for model {model}: {reason}")]
    ExecutionBackendError { model: String, reason: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Post-processing of model {model} failed: {reason}")]
    PostProcessError { model: String, reason: String },

    #[error("End-of-cycle action '{action}' failed: {reason}")]
    EndOfCycleError { action: String, reason: String },

    #[error("Could not determine peak boundary value of model {model}: {reason}")]
    BoundaryValueError { model: String, reason: String },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Cycle scheduling was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
