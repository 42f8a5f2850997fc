use std::path::PathBuf;

use crate::WriterState;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("storage unavailable for {path}: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write audio chunk: {0}")]
    Write(#[source] std::io::Error),
    #[error("failed to finalize {path}: {reason}")]
    Finalize { path: PathBuf, reason: String },
    #[error("cannot {operation} while writer is {state:?}")]
    InvalidState {
        operation: &'static str,
        state: WriterState,
    },
    #[error("{path} is not a 16-bit PCM WAV file")]
    NotWav { path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("data directory not available")]
    DataDirUnavailable,
    #[error("path must be absolute")]
    PathNotAbsolute,
    #[error("path exists but is not a directory")]
    PathIsNotDirectory,
}

pub type Result<T> = std::result::Result<T, Error>;
