use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid {kind} id: {value:?}")]
    InvalidId { kind: &'static str, value: String },

    #[error("expected {expected}, got {value:?}")]
    InvalidReference {
        expected: &'static str,
        value: String,
    },

    #[error("table {table}: id {id} listed in allIds has no record")]
    MissingRecord { table: &'static str, id: String },

    #[error("table {table}: record {id} is not listed in allIds")]
    UnlistedRecord { table: &'static str, id: String },

    #[error("table {table}: key {key} holds record {id}")]
    KeyMismatch {
        table: &'static str,
        key: String,
        id: String,
    },

    #[error("table {table}: id {id} listed more than once")]
    DuplicateId { table: &'static str, id: String },

    #[error("failed to read document {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse document: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
