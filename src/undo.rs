//! Reverting an organize run from its manifest.
//!
//! Moved files are moved back to where they came from; copies are deleted. Undo is
//! best effort: every record is attempted, problems are collected in the
//! [`UndoReport`], and nothing already reverted is rolled forward again.

use crate::error::{FileSorterError, Result};
use crate::manifest::{self, TransferRecord};
use crate::output::OutputFormatter;
use crate::transfer::{self, TransferMode};
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of an undo run.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Records that were reverted.
    pub reverted: usize,
    /// Records that could not be reverted without an I/O error, e.g. because the
    /// destination file is gone or the mode is unknown.
    pub warnings: Vec<(PathBuf, String)>,
    /// Records whose reversal failed.
    pub errors: Vec<FileSorterError>,
}

impl UndoReport {
    /// Records that were not reverted, warnings included.
    pub fn error_count(&self) -> usize {
        self.warnings.len() + self.errors.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.error_count() == 0
    }
}

/// Replays the inverse of every transfer recorded in the manifest at `path`.
///
/// # Errors
///
/// Returns `NotFound` or `Malformed` if the manifest cannot be read. Per-record
/// problems never abort the run; they end up in the returned report.
///
/// # Examples
///
/// ```no_run
/// use filesorter::undo::undo_from_manifest;
/// use std::path::Path;
///
/// let report = undo_from_manifest(Path::new("/sorted/manifest_2025-10-08T12-00-00.json"))?;
/// println!("Reverted {} transfers", report.reverted);
/// # Ok::<(), filesorter::FileSorterError>(())
/// ```
pub fn undo_from_manifest(path: &Path) -> Result<UndoReport> {
    let records = manifest::read(path)?;
    let mut report = UndoReport::default();

    for record in records.iter().filter(|r| r.is_transfer()) {
        match revert(record) {
            Ok(Reverted::Done) => report.reverted += 1,
            Ok(Reverted::Warning(message)) => {
                OutputFormatter::warning(&message);
                report.warnings.push((record.dst.clone(), message));
            }
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                report.errors.push(e);
            }
        }
    }

    if report.is_complete_success() {
        OutputFormatter::success(&format!(
            "Undo complete: {} transfer(s) reverted.",
            report.reverted
        ));
    } else {
        OutputFormatter::error(&format!(
            "Undo finished with {} error(s); {} transfer(s) reverted.",
            report.error_count(),
            report.reverted
        ));
    }

    Ok(report)
}

enum Reverted {
    Done,
    Warning(String),
}

fn revert(record: &TransferRecord) -> Result<Reverted> {
    let step_failure = |source: std::io::Error| FileSorterError::UndoStepFailure {
        src: record.src.clone(),
        dst: record.dst.clone(),
        source,
    };

    match record.transfer_mode() {
        Some(TransferMode::Move) => {
            if !record.dst.exists() {
                return Ok(Reverted::Warning(format!(
                    "Destination missing, cannot move back: {}",
                    record.dst.display()
                )));
            }
            if let Some(parent) = record.src.parent() {
                fs::create_dir_all(parent).map_err(step_failure)?;
            }
            transfer::move_file(&record.dst, &record.src).map_err(step_failure)?;
        }
        Some(TransferMode::Copy) => {
            if !record.dst.exists() {
                return Ok(Reverted::Warning(format!(
                    "Copy missing, cannot delete: {}",
                    record.dst.display()
                )));
            }
            fs::remove_file(&record.dst).map_err(step_failure)?;
        }
        None => {
            return Ok(Reverted::Warning(format!(
                "Unknown mode '{}' in manifest for {}",
                record.mode,
                record.dst.display()
            )));
        }
    }

    Ok(Reverted::Done)
}
