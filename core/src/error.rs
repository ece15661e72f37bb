use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    /// The text produced no terms after tokenization, so it has no `max_tf`.
    #[error("document {filename} contains no indexable terms")]
    EmptyDocument { filename: String },

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("postings encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("metadata encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io { path: path.into(), source }
    }

    pub(crate) fn corrupt(msg: impl Into<String>) -> Self {
        IndexError::CorruptIndex(msg.into())
    }
}
