use thiserror::Error;
use crate::analyser::AnalysisError;

/// Everything that can go wrong outside the pure engine: files, parsing, configuration.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
