//! Command-line interface for filesorter.
//!
//! Two ways to invoke it:
//! - `filesorter SOURCE DEST [options]` organizes SOURCE into DEST
//! - `filesorter --undo MANIFEST` reverts a previous run
//!
//! Exit codes: 0 on success, 1 for runtime errors while organizing, 2 for an
//! invalid source or a missing manifest.

use crate::config::Config;
use crate::conflict::ConflictStrategy;
use crate::error::{FileSorterError, Result};
use crate::organizer::{OrganizeOptions, OrganizeReport, Organizer};
use crate::output::OutputFormatter;
use crate::transfer::TransferMode;
use crate::undo::undo_from_manifest;
use clap::Parser;
use std::path::{Path, PathBuf};

pub const EXIT_OK: i32 = 0;
pub const EXIT_RUNTIME_ERROR: i32 = 1;
pub const EXIT_INVALID_INPUT: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "filesorter",
    version,
    about = "Sort files into category folders, with dry-run and undo."
)]
pub struct Args {
    /// Directory containing the files to organize.
    #[arg(required_unless_present = "undo", conflicts_with = "undo")]
    pub source: Option<PathBuf>,

    /// Directory receiving the organized layout.
    #[arg(required_unless_present = "undo", conflicts_with = "undo")]
    pub dest: Option<PathBuf>,

    /// Revert the transfers recorded in this manifest.
    #[arg(long, value_name = "MANIFEST")]
    pub undo: Option<PathBuf>,

    /// Move files or copy them.
    #[arg(long, default_value = "move", value_parser = ["move", "copy"])]
    pub mode: String,

    /// Also organize files in subdirectories of the source.
    #[arg(long)]
    pub recursive: bool,

    /// Only show what would happen.
    #[arg(long)]
    pub dry_run: bool,

    /// Rule file (JSON, YAML or TOML) mapping extensions to categories.
    #[arg(long, value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Additionally sort into <year>/<month> folders by modification time.
    #[arg(long)]
    pub by_date: bool,

    /// What to do when a different file already occupies the destination.
    #[arg(long, default_value = "rename", value_parser = ["rename", "skip"])]
    pub conflict: String,

    /// Where to write the manifest (default: DEST/manifest_<timestamp>.json).
    #[arg(long, value_name = "PATH")]
    pub manifest_out: Option<PathBuf>,

    /// Filter configuration file (TOML).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Runs the command described by `args` and returns the process exit code.
pub fn run_cli(args: Args) -> i32 {
    match &args.undo {
        Some(manifest) => run_undo(manifest),
        None => run_organize(&args),
    }
}

fn run_undo(manifest: &Path) -> i32 {
    if !manifest.exists() {
        OutputFormatter::error(&format!("Manifest not found: {}", manifest.display()));
        return EXIT_INVALID_INPUT;
    }

    OutputFormatter::info(&format!("Undoing transfers from {}", manifest.display()));
    match undo_from_manifest(manifest) {
        Ok(_) => EXIT_OK,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            e.exit_code()
        }
    }
}

fn run_organize(args: &Args) -> i32 {
    let options = match organize_options(args) {
        Ok(options) => options,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            return EXIT_INVALID_INPUT;
        }
    };

    if !options.source.is_dir() {
        OutputFormatter::error(&format!(
            "Source does not exist or is not a directory: {}",
            options.source.display()
        ));
        return EXIT_INVALID_INPUT;
    }

    match organize_with_config(options, args.config.as_deref()) {
        Ok(report) => {
            if args.dry_run {
                OutputFormatter::dry_run_notice(
                    "Dry run complete. Remove --dry-run to apply these changes.",
                );
            } else {
                report_outcome(&report);
            }
            EXIT_OK
        }
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            EXIT_RUNTIME_ERROR
        }
    }
}

/// Builds run options from parsed arguments.
///
/// # Errors
///
/// Returns `InvalidArgument` for a missing source/destination or an unknown
/// mode or conflict strategy.
pub fn organize_options(args: &Args) -> Result<OrganizeOptions> {
    let (Some(source), Some(dest)) = (&args.source, &args.dest) else {
        return Err(FileSorterError::InvalidArgument(
            "both SOURCE and DEST are required (or use --undo)".to_string(),
        ));
    };

    let mode: TransferMode = args.mode.parse()?;
    let conflict: ConflictStrategy = args.conflict.parse()?;

    Ok(OrganizeOptions::new(source, dest)
        .mode(mode)
        .recursive(args.recursive)
        .dry_run(args.dry_run)
        .rules_path(args.rules.clone())
        .by_date(args.by_date)
        .conflict(conflict)
        .manifest_out(args.manifest_out.clone()))
}

/// Loads the filter configuration and runs the organizer with it.
///
/// # Arguments
///
/// * `options` - Run options, usually from [`organize_options`]
/// * `config_path` - Explicit config file; `None` uses the default lookup
pub fn organize_with_config(
    options: OrganizeOptions,
    config_path: Option<&Path>,
) -> Result<OrganizeReport> {
    let filter = Config::load(config_path)?.file_filter()?;
    Organizer::new(options).with_filter(filter).run()
}

fn report_outcome(report: &OrganizeReport) {
    if !report.failures.is_empty() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be transferred. Please review the errors above.",
            report.failures.len()
        ));
    }

    if report.manifest_written {
        OutputFormatter::success(&format!(
            "Done. Manifest at: {} (undo with --undo {})",
            report.manifest_path.display(),
            report.manifest_path.display()
        ));
    } else {
        OutputFormatter::warning(&format!(
            "Done, but no manifest was written to {}. These transfers cannot be undone automatically.",
            report.manifest_path.display()
        ));
    }
}
