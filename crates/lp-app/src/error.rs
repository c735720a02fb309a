//! Error types for the lp-app service layer.

use std::path::PathBuf;

/// Application error shared by every front end. Backend errors are wrapped
/// as-is; file errors carry the path they happened on.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("model error: {0}")]
    Model(#[from] lp_model::ModelError),

    #[error("signal error: {0}")]
    Signal(#[from] lp_signal::SignalError),

    #[error("numeric error: {0}")]
    Core(#[from] lp_core::CoreError),

    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("CSV error in {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for lp-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::FileRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::FileWrite {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        AppError::Csv {
            path: path.into(),
            source,
        }
    }
}
