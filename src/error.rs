use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FillbibError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid JSON payload: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error on {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No bibliography file declared (no \\bibdata line) in {0:?}")]
    NoBibliographyDeclared(PathBuf),
}

impl FillbibError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FillbibError::IoError {
            path: path.into(),
            source,
        }
    }
}
