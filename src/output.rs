//! Console output for organize and undo runs.
//!
//! Every user-visible line goes through [`OutputFormatter`] so markers and colors
//! stay consistent: `[PLAN]` for planned transfers, `[SKIP]` for skipped files,
//! `[WARN]`/`[ERROR]` for per-item problems.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Prints every user-visible line of a run.
///
/// Informational lines go to stdout; errors go to stderr.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// OutputFormatter::success("Manifest written");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message to stderr in red.
    ///
    /// # Arguments
    ///
    /// * `message` - The message to display after the `[ERROR]` marker
    pub fn error(message: &str) {
        eprintln!("{} {}", "[ERROR]".red().bold(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "[WARN]".yellow().bold(), message);
    }

    /// Prints a neutral progress message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a bold section header preceded by a blank line.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints one planned transfer, e.g. `[PLAN] MOVE /src/a.png -> /dest/Images/a.png`.
    pub fn plan(mode: &str, src: &Path, dst: &Path) {
        println!(
            "{} {} {} -> {}",
            "[PLAN]".blue().bold(),
            mode.to_uppercase(),
            src.display(),
            dst.display()
        );
    }

    /// Prints a skipped file with the reason it was skipped.
    pub fn skip(reason: &str, path: &Path) {
        println!("{} {}: {}", "[SKIP]".dimmed(), reason, path.display());
    }

    /// Prints a `[DRY RUN]` line in yellow.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use filesorter::output::OutputFormatter;
    /// OutputFormatter::dry_run_notice("No changes made, no manifest written.");
    /// ```
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates the progress bar shown while transfers execute.
    ///
    /// The bar hides itself when not attached to a terminal.
    pub fn transfer_progress(total: u64) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        let pb = ProgressBar::new(total);
        pb.set_style(style);
        pb
    }

    /// Prints how many files went into each category.
    pub fn category_summary(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.chars().count())
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));
        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count)
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files)
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
