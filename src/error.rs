// Error types for the reference index, the collection ledger and the compiler.
// A card that is not found is NOT an error - lookups return Option.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while building a reference index
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read reference directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read reference file {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to load compiled artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: CompileError,
    },
}

/// Failures while reading or appending to the collection file
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Collection file {path} is not accessible: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Collection file {path} could not be parsed: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Failures of the batch compiler. Every variant is fatal for a compile run.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Index(#[from] Box<IndexError>),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact serialization error on {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<IndexError> for CompileError {
    fn from(err: IndexError) -> Self {
        CompileError::Index(Box::new(err))
    }
}

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
