use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Corpus root or one of its documents could not be read as UTF-8 text.
    #[error("cannot read corpus path {path}: {source}")]
    CorpusAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("k must be a positive integer, got {0}")]
    InvalidK(usize),

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn corpus(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::CorpusAccess { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
