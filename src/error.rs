use thiserror::Error;

use crate::task::Fault;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A failure on the data path: a backend workflow rejected or mishandled a
/// request, or its execution unit faulted.
///
/// Cloneable: a settled result is observed by any number of readers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("{workflow} failed: {reason}")]
    Backend { workflow: String, reason: String },

    #[error("task fault: {0}")]
    Fault(String),
}

impl From<Fault> for WorkflowError {
    fn from(fault: Fault) -> Self {
        WorkflowError::Fault(fault.reason().to_string())
    }
}
