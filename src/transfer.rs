//! Executing single file transfers.
//!
//! A transfer either moves a file (the source disappears) or copies it with its
//! permissions and timestamps (the source stays untouched). Each transfer is
//! independent: a failure affects only that one file.

use crate::error::{FileSorterError, Result};
use filetime::FileTime;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// How files are relocated into the destination tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Move,
    Copy,
}

impl TransferMode {
    /// The name stored in manifests.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMode::Move => "move",
            TransferMode::Copy => "copy",
        }
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferMode {
    type Err = FileSorterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "move" => Ok(TransferMode::Move),
            "copy" => Ok(TransferMode::Copy),
            other => Err(FileSorterError::InvalidArgument(format!(
                "mode must be 'move' or 'copy', got '{other}'"
            ))),
        }
    }
}

/// Performs one transfer from `src` to the already-resolved `dst`.
///
/// # Errors
///
/// Returns `TransferFailure` with the underlying I/O error.
pub fn execute(src: &Path, dst: &Path, mode: TransferMode) -> Result<()> {
    let outcome = match mode {
        TransferMode::Move => move_file(src, dst),
        TransferMode::Copy => copy_with_metadata(src, dst),
    };

    outcome.map_err(|source| FileSorterError::TransferFailure {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    })
}

/// Moves a file, falling back to copy-and-delete when a plain rename is
/// impossible (for example across filesystems).
pub(crate) fn move_file(src: &Path, dst: &Path) -> io::Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    copy_with_metadata(src, dst)?;
    if let Err(e) = fs::remove_file(src) {
        // Leave no half-finished move behind.
        let _ = fs::remove_file(dst);
        return Err(e);
    }
    Ok(())
}

/// Copies content and permissions, then carries over access/modification times.
fn copy_with_metadata(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst)?;

    let metadata = fs::metadata(src)?;
    let atime = FileTime::from_last_access_time(&metadata);
    let mtime = FileTime::from_last_modification_time(&metadata);
    filetime::set_file_times(dst, atime, mtime)
}
