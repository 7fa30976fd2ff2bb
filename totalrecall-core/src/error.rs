//! Error types for totalrecall-core

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::Stage;
use crate::types::Artifact;

/// Main error type for the totalrecall-core library
#[derive(Error, Debug)]
pub enum Error {
    /// An expected path or subfolder is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// The database or image store is absent after resolution
    #[error("Windows Recall store not found: missing {artifact} at {}", .path.display())]
    MissingArtifact { artifact: Artifact, path: PathBuf },

    /// Source location could not be made readable
    #[error("permission error: {0}")]
    Permission(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory walk error while copying a tree
    #[error("IO error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Database open or query failure
    #[error("database error: {0}")]
    Query(#[from] rusqlite::Error),

    /// A row could not be decoded into a capture event
    #[error("malformed row {row}: {message}")]
    RowDecode { row: usize, message: String },

    /// The caller declined the extraction
    #[error("extraction aborted")]
    Aborted,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A pipeline stage failed
    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the pipeline stage it came from.
    pub fn in_stage(self, stage: Stage) -> Self {
        Error::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through stage wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the run ended because the user declined it.
    pub fn is_aborted(&self) -> bool {
        matches!(self.root(), Error::Aborted)
    }

    /// Process exit code for this error.
    ///
    /// A declined run is not a failure and exits with 0.
    pub fn exit_code(&self) -> i32 {
        match self.root() {
            Error::Aborted => 0,
            Error::NotFound(_) => 2,
            Error::MissingArtifact { .. } => 3,
            Error::Permission(_) => 4,
            Error::Io(_) | Error::Walk(_) => 5,
            Error::Query(_) => 6,
            Error::RowDecode { .. } => 7,
            Error::Config(_) => 8,
            Error::Stage { .. } => 1,
        }
    }
}

/// Result type alias for totalrecall-core
pub type Result<T> = std::result::Result<T, Error>;
