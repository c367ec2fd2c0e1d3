//! Errors surfaced by the sequencing and attack engine.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// A raw record has no usable direction, or the trace order cannot be determined.
    #[error("Malformed trace: {0}")]
    MalformedTrace(String),

    #[error("Unknown attack profile '{0}'")]
    UnknownProfile(String),

    #[error("Drop index {index} is out of range for a trace of {len} packets")]
    InvalidDropIndex { index: usize, len: usize },

    #[error("Cannot drop {requested} packets, only {available} candidates available")]
    InsufficientPackets { requested: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
