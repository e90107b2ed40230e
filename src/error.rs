//! Error types shared by every stage of an organize or undo run.
//!
//! Structural errors (bad arguments, missing rule or manifest files, unreadable
//! manifests) abort an operation before anything on disk changes. Per-item errors
//! (a single failed transfer, a single failed undo step) are collected into the
//! run reports instead of being propagated.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileSorterError {
    /// Bad mode or conflict strategy, or a missing/invalid source or destination.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced rule file, manifest or config file does not exist.
    #[error("{what} not found: {}", path.display())]
    NotFound { what: &'static str, path: PathBuf },

    /// A rule file or manifest could not be parsed.
    #[error("Malformed {what} {}: {reason}", path.display())]
    Malformed {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    /// Moving or copying a single file failed.
    #[error("Transfer failed: {} -> {}: {source}", src.display(), dst.display())]
    TransferFailure {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be persisted after the transfers completed.
    #[error("Could not write manifest {}: {reason}", path.display())]
    ManifestWriteFailure { path: PathBuf, reason: String },

    /// Reverting a single manifest record failed.
    #[error("Undo failed for {} -> {}: {source}", dst.display(), src.display())]
    UndoStepFailure {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid filter configuration (TOML syntax, glob or regex).
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FileSorterError>;

impl FileSorterError {
    /// Process exit code for errors that end a CLI invocation.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) | Self::NotFound { .. } => 2,
            _ => 1,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_errors_exit_with_two() {
        let err = FileSorterError::NotFound {
            what: "Manifest",
            path: PathBuf::from("/tmp/missing.json"),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "Manifest not found: /tmp/missing.json");

        let err = FileSorterError::InvalidArgument("mode must be 'move' or 'copy'".into());
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_runtime_errors_exit_with_one() {
        let err = FileSorterError::Malformed {
            what: "manifest",
            path: PathBuf::from("m.json"),
            reason: "expected value".into(),
        };
        assert_eq!(err.exit_code(), 1);

        let err = FileSorterError::io(
            "/some/dir",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("/some/dir"));
    }
}
