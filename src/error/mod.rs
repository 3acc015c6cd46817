use std::fmt;

/// Errors from the chat/schedule stores and configuration loading.
#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Invalid(String),
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
    CsvError(csv::Error),
}

impl std::error::Error for StoreError {}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "not found: {}", what),
            StoreError::Invalid(what) => write!(f, "invalid: {}", what),
            StoreError::IoError(e) => write!(f, "IO error: {}", e),
            StoreError::SerdeError(e) => write!(f, "Serialization error: {}", e),
            StoreError::CsvError(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::IoError(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::SerdeError(err)
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::CsvError(err)
    }
}

/// Errors from the messaging transport. `Blocked` means the recipient is
/// unreachable for good (bot blocked, chat gone) and the chat should be
/// dropped; everything else is transient and retried on a later tick.
#[derive(Debug)]
pub enum SendError {
    Blocked,
    Transient(String),
}

impl std::error::Error for SendError {}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Blocked => write!(f, "recipient unreachable"),
            SendError::Transient(e) => write!(f, "transient send error: {}", e),
        }
    }
}
