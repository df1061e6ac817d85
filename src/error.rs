use std::fmt::{self, Display};
use std::io;

/// Provides `SeirsError` and maps other errors to
/// convert to a `SeirsError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SeirsError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    ParameterError(String),
    ReportError(String),
    SeirsError(String),
}

impl From<io::Error> for SeirsError {
    fn from(error: io::Error) -> Self {
        SeirsError::IoError(error)
    }
}

impl From<serde_json::Error> for SeirsError {
    fn from(error: serde_json::Error) -> Self {
        SeirsError::JsonError(error)
    }
}

impl From<csv::Error> for SeirsError {
    fn from(error: csv::Error) -> Self {
        SeirsError::CsvError(error)
    }
}

impl From<tempfile::PersistError> for SeirsError {
    fn from(error: tempfile::PersistError) -> Self {
        SeirsError::IoError(error.error)
    }
}

impl From<tempfile::PathPersistError> for SeirsError {
    fn from(error: tempfile::PathPersistError) -> Self {
        SeirsError::IoError(error.error)
    }
}

impl From<String> for SeirsError {
    fn from(error: String) -> Self {
        SeirsError::SeirsError(error)
    }
}

impl From<&str> for SeirsError {
    fn from(error: &str) -> Self {
        SeirsError::SeirsError(error.to_string())
    }
}

impl std::error::Error for SeirsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SeirsError::IoError(error) => Some(error),
            SeirsError::JsonError(error) => Some(error),
            SeirsError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SeirsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SeirsError::IoError(error) => write!(f, "I/O error: {error}"),
            SeirsError::JsonError(error) => write!(f, "JSON error: {error}"),
            SeirsError::CsvError(error) => write!(f, "CSV error: {error}"),
            SeirsError::ParameterError(msg) => write!(f, "Invalid parameters: {msg}"),
            SeirsError::ReportError(msg) => write!(f, "Report error: {msg}"),
            SeirsError::SeirsError(msg) => write!(f, "Error: {msg}"),
        }
    }
}
