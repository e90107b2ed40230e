//! Conflict resolution and duplicate detection.
//!
//! When a planned destination is already occupied, the organizer first checks
//! whether the occupant is a duplicate of the source (same size, then same
//! content hash). Duplicates are skipped silently. Otherwise the configured
//! [`ConflictStrategy`] decides: skip the file, or pick the first free
//! `name (N).ext` next to the target.
//!
//! The content hash is the first 12 hex characters of a SHA-256 digest. That is a
//! heuristic: two different files of equal size colliding on 48 bits is unlikely
//! but not impossible, in which case the source is treated as a duplicate.

use crate::error::FileSorterError;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Chunk size used while hashing file contents.
pub const HASH_CHUNK_SIZE: usize = 1 << 20;

/// Number of hex characters kept from the SHA-256 digest.
pub const HASH_PREFIX_LEN: usize = 12;

/// What to do when the destination is occupied by a different file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictStrategy {
    /// Append ` (N)` before the extension until the name is free.
    #[default]
    Rename,
    /// Leave the source where it is.
    Skip,
}

impl ConflictStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictStrategy::Rename => "rename",
            ConflictStrategy::Skip => "skip",
        }
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = FileSorterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rename" => Ok(ConflictStrategy::Rename),
            "skip" => Ok(ConflictStrategy::Skip),
            other => Err(FileSorterError::InvalidArgument(format!(
                "conflict strategy must be 'rename' or 'skip', got '{other}'"
            ))),
        }
    }
}

/// Outcome of resolving a planned destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Transfer to this path.
    Use(PathBuf),
    /// Do not transfer the file.
    Skip,
}

/// Resolves `target` against the paths reported as occupied.
///
/// `occupied` is usually `Path::exists`; dry runs also count paths already
/// planned earlier in the same run.
pub fn resolve<F>(target: &Path, strategy: ConflictStrategy, occupied: F) -> Resolution
where
    F: Fn(&Path) -> bool,
{
    if !occupied(target) {
        return Resolution::Use(target.to_path_buf());
    }

    match strategy {
        ConflictStrategy::Skip => Resolution::Skip,
        ConflictStrategy::Rename => Resolution::Use(next_free_name(target, occupied)),
    }
}

fn next_free_name<F>(target: &Path, occupied: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    let parent = target.parent().unwrap_or_else(|| Path::new(""));
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u64..)
        .map(|n| parent.join(format!("{stem} ({n}){suffix}")))
        .find(|candidate| !occupied(candidate.as_path()))
        .unwrap_or_else(|| target.to_path_buf())
}

/// Hashes a file in [`HASH_CHUNK_SIZE`] chunks, keeping [`HASH_PREFIX_LEN`] hex chars.
pub fn content_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    let mut digest = hex::encode(hasher.finalize());
    digest.truncate(HASH_PREFIX_LEN);
    Ok(digest)
}

/// Returns true if `target` holds the same content as `source`.
///
/// Sizes are compared first; hashes only for equal sizes. Any I/O error while
/// comparing counts as "not a duplicate".
pub fn is_duplicate(source: &Path, target: &Path) -> bool {
    let same_size = match (source.metadata(), target.metadata()) {
        (Ok(a), Ok(b)) => a.len() == b.len(),
        _ => false,
    };
    if !same_size {
        return false;
    }

    match (content_hash(source), content_hash(target)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
