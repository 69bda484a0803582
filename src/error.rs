//! Error types for the fingerprint engine crate.

use std::fmt;

pub type Result<T> = std::result::Result<T, FingerprintError>;

/// Errors raised while ingesting fingerprint databases.
///
/// `DocumentError` is structural: the input is not a well-formed definition
/// document and no partial database can be salvaged, so it is fatal in both
/// parsing modes. The remaining parse variants are definition-level: they
/// describe a single malformed fingerprint entry and are recoverable in
/// lenient mode.
#[derive(Debug, Clone, PartialEq)]
pub enum FingerprintError {
    DocumentError(String),
    MissingAttribute(String),
    InvalidPattern(String),
    InvalidPosition(String),
    AmbiguousFieldRule(String),
    IoError(String),
}

impl fmt::Display for FingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FingerprintError::DocumentError(msg) => write!(f, "Document error: {msg}"),
            FingerprintError::MissingAttribute(name) => {
                write!(f, "Required attribute \"{name}\" does not exist")
            }
            FingerprintError::InvalidPattern(msg) => write!(f, "Invalid pattern: {msg}"),
            FingerprintError::InvalidPosition(msg) => {
                write!(f, "Invalid field position: {msg}")
            }
            FingerprintError::AmbiguousFieldRule(msg) => {
                write!(f, "Ambiguous field rule: {msg}")
            }
            FingerprintError::IoError(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for FingerprintError {}

impl From<std::io::Error> for FingerprintError {
    fn from(err: std::io::Error) -> Self {
        FingerprintError::IoError(err.to_string())
    }
}
