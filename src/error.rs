use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AclError {
    #[error("malformed ACL entry: {0}")]
    MalformedEntry(String),

    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("path must be absolute: {0}")]
    PathNotAbsolute(String),

    #[error("target does not exist: {0}")]
    TargetMissing(String),

    #[error("command failed: {0}")]
    CommandFailure(String),

    #[error("prerequisite failed: {0}")]
    OrderingViolation(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl AclError {
    /// Short, stable name of the error kind, used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AclError::MalformedEntry(_) => "malformed_entry",
            AclError::InvalidDeclaration(_) => "invalid_declaration",
            AclError::PathNotAbsolute(_) => "path_not_absolute",
            AclError::TargetMissing(_) => "target_missing",
            AclError::CommandFailure(_) => "command_failure",
            AclError::OrderingViolation(_) => "ordering_violation",
            AclError::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for AclError {
    fn from(err: serde_json::Error) -> Self {
        AclError::InvalidDeclaration(err.to_string())
    }
}

impl From<walkdir::Error> for AclError {
    fn from(err: walkdir::Error) -> Self {
        AclError::Io(err.to_string())
    }
}

impl From<std::io::Error> for AclError {
    fn from(err: std::io::Error) -> Self {
        AclError::Io(err.to_string())
    }
}
