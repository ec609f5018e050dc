use std::path::PathBuf;

/// Failures while acquiring the current position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PositionError {
    #[error("Position unavailable: {0}")]
    Unavailable(String),
    #[error("Position request failed: {0}")]
    Request(String),
    #[error("Invalid position: {0}")]
    Invalid(String),
}

/// Failures while fetching or parsing a daily forecast.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Forecast request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Forecast service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse forecast JSON: {0}")]
    Parse(String),
    #[error("Forecast arrays are misaligned: {0}")]
    Misaligned(String),
}

/// Failures while loading one of the static datasets.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Failed to read dataset file {}: {message}", path.display())]
    Read { path: PathBuf, message: String },
    #[error("Failed to parse {dataset} dataset: {message}")]
    Parse { dataset: &'static str, message: String },
}

/// Invalid transitions of the acquisition state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("A position request is already in flight")]
    AcquireInProgress,
    #[error("No position request is in flight")]
    NotAcquiring,
}
