use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("{} is not a file", path.display())]
    NotAFile { path: PathBuf },
    #[error("{} has {lines} lines but the trace reports line {line}", path.display())]
    LineOutOfRange {
        path: PathBuf,
        line: u64,
        lines: usize,
    },
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("trace sink error: {0}")]
    Sink(#[from] io::Error),
}

pub type CoverageResult<T> = Result<T, CoverageError>;

impl CoverageError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn not_a_file(path: impl Into<PathBuf>) -> Self {
        Self::NotAFile { path: path.into() }
    }
}
