//! The organize run.
//!
//! For every file under the source root, in directory-walk order:
//!
//! 1. classify it into a category,
//! 2. plan its destination path,
//! 3. skip it if the destination already holds identical content,
//! 4. otherwise resolve a conflicting destination (rename or skip),
//! 5. report the planned transfer and, unless this is a dry run, execute it and
//!    record it for the manifest.
//!
//! A failed transfer only affects its own file. The manifest is written once all
//! files were processed; failing to write it is a warning, not an error.

use crate::classifier::Classifier;
use crate::config::FileFilter;
use crate::conflict::{self, ConflictStrategy, Resolution};
use crate::error::{FileSorterError, Result};
use crate::manifest::{self, TransferRecord};
use crate::output::OutputFormatter;
use crate::planner::{FileEntry, PathPlanner};
use crate::rules::RuleSet;
use crate::transfer::{self, TransferMode};
use indicatif::ProgressBar;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Everything an organize run needs to know.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub mode: TransferMode,
    /// Walk subdirectories of the source, not just its direct children.
    pub recursive: bool,
    /// Report planned transfers without touching the filesystem.
    pub dry_run: bool,
    /// Rule file replacing the default extension rules.
    pub rules_path: Option<PathBuf>,
    /// Partition destinations by modification year and month.
    pub by_date: bool,
    pub conflict: ConflictStrategy,
    /// Manifest location; defaults to a timestamped file in the destination root.
    pub manifest_out: Option<PathBuf>,
}

impl OrganizeOptions {
    /// Options with the defaults: move, non-recursive, rename on conflict.
    pub fn new(source: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
            mode: TransferMode::default(),
            recursive: false,
            dry_run: false,
            rules_path: None,
            by_date: false,
            conflict: ConflictStrategy::default(),
            manifest_out: None,
        }
    }

    pub fn mode(mut self, mode: TransferMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn rules_path(mut self, path: Option<PathBuf>) -> Self {
        self.rules_path = path;
        self
    }

    pub fn by_date(mut self, by_date: bool) -> Self {
        self.by_date = by_date;
        self
    }

    pub fn conflict(mut self, conflict: ConflictStrategy) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn manifest_out(mut self, path: Option<PathBuf>) -> Self {
        self.manifest_out = path;
        self
    }
}

/// A transfer that was planned (and, outside dry runs, attempted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTransfer {
    pub src: PathBuf,
    pub dst: PathBuf,
    pub category: String,
}

/// Why a file was left where it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The destination already holds the same content.
    Duplicate { existing: PathBuf },
    /// The destination is taken and the conflict strategy is `skip`.
    Occupied { existing: PathBuf },
}

/// Outcome of an organize run.
#[derive(Debug)]
pub struct OrganizeReport {
    /// Where the manifest was (or, for dry runs and failed writes, would have been) written.
    pub manifest_path: PathBuf,
    pub manifest_written: bool,
    /// Files found under the source after filtering.
    pub total_files: usize,
    pub planned: Vec<PlannedTransfer>,
    /// Executed transfers, in execution order.
    pub records: Vec<TransferRecord>,
    pub skipped: Vec<(PathBuf, SkipReason)>,
    /// Per-file failures; the run continued past each of them.
    pub failures: Vec<FileSorterError>,
    pub manifest_error: Option<FileSorterError>,
    /// Files per category: planned ones for dry runs, transferred ones otherwise.
    pub category_counts: BTreeMap<String, usize>,
}

impl OrganizeReport {
    pub fn transferred(&self) -> usize {
        self.records.len()
    }
}

/// Runs [`OrganizeOptions`] against the filesystem.
pub struct Organizer {
    options: OrganizeOptions,
    filter: FileFilter,
}

impl Organizer {
    pub fn new(options: OrganizeOptions) -> Self {
        Self {
            options,
            filter: FileFilter::allow_all(),
        }
    }

    /// Restricts the run to files the filter allows.
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Organizes the source tree into the destination tree.
    ///
    /// # Errors
    ///
    /// Fails before any filesystem change if the source is not a directory or the
    /// rule file is missing or malformed. Per-file problems are collected in the
    /// returned report instead.
    pub fn run(&self) -> Result<OrganizeReport> {
        let opts = &self.options;
        let source = absolute(&opts.source)?;
        let dest = absolute(&opts.dest)?;

        if !source.is_dir() {
            return Err(FileSorterError::InvalidArgument(format!(
                "source does not exist or is not a directory: {}",
                source.display()
            )));
        }

        let rules = RuleSet::load(opts.rules_path.as_deref())?;
        if rules.is_empty() {
            OutputFormatter::warning("No extension rules loaded; classifying by MIME type only.");
        }

        // Nothing on disk changes before the rules are known to be usable.
        if !opts.dry_run {
            fs::create_dir_all(&dest).map_err(|e| FileSorterError::io(&dest, e))?;
        }

        let classifier = Classifier::new(rules);
        let planner = PathPlanner::new(&dest, opts.by_date);
        let files = self.collect_files(&source, &dest);

        if opts.dry_run {
            OutputFormatter::dry_run_notice(&format!(
                "Planning {} file(s) from {}",
                files.len(),
                source.display()
            ));
        } else {
            OutputFormatter::info(&format!(
                "Organizing {} file(s) from {} into {}",
                files.len(),
                source.display(),
                dest.display()
            ));
        }

        let progress = (!opts.dry_run).then(|| OutputFormatter::transfer_progress(files.len() as u64));
        let mut run = RunState::default();

        for entry in &files {
            self.process_file(entry, &classifier, &planner, progress.as_ref(), &mut run);
            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }
        if let Some(pb) = &progress {
            pb.finish_and_clear();
        }

        let manifest_path = opts
            .manifest_out
            .clone()
            .unwrap_or_else(|| manifest::default_manifest_path(&dest));

        let mut manifest_written = false;
        let mut manifest_error = None;
        if opts.dry_run {
            OutputFormatter::dry_run_notice("No changes made, no manifest written.");
        } else {
            match manifest::write(&manifest_path, &run.records) {
                Ok(()) => {
                    manifest_written = true;
                    OutputFormatter::success(&format!(
                        "Manifest written: {} ({} entries)",
                        manifest_path.display(),
                        run.records.len()
                    ));
                }
                Err(e) => {
                    OutputFormatter::warning(&e.to_string());
                    manifest_error = Some(e);
                }
            }
            OutputFormatter::info(&format!(
                "Transferred {} of {} file(s)",
                run.records.len(),
                files.len()
            ));
        }

        // Dry runs summarize the plan; real runs only what was actually transferred.
        let category_counts = if opts.dry_run {
            count_categories(run.planned.iter().map(|p| p.category.as_str()))
        } else {
            count_categories(run.records.iter().map(|r| r.category.as_str()))
        };
        if !category_counts.is_empty() {
            OutputFormatter::category_summary(&category_counts, category_counts.values().sum());
        }

        Ok(OrganizeReport {
            manifest_path,
            manifest_written,
            total_files: files.len(),
            planned: run.planned,
            records: run.records,
            skipped: run.skipped,
            failures: run.failures,
            manifest_error,
            category_counts,
        })
    }

    /// Lists the files taking part in the run, in walk order.
    ///
    /// Symlinks pointing at regular files count as files; links to directories
    /// are not followed. When the destination lies inside the source, its subtree
    /// is left out so already organized files (and manifests) are not picked up again.
    fn collect_files(&self, source: &Path, dest: &Path) -> Vec<FileEntry> {
        let prune_dest = dest != source && dest.starts_with(source);
        let max_depth = if self.options.recursive { usize::MAX } else { 1 };

        WalkDir::new(source)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| !(prune_dest && e.path().starts_with(dest)))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    OutputFormatter::warning(&format!("Cannot read directory entry: {e}"));
                    None
                }
            })
            .filter(|entry| {
                let file_type = entry.file_type();
                file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
            })
            .filter(|entry| {
                let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
                self.filter.allows(relative)
            })
            .filter_map(|entry| match FileEntry::from_path(entry.path()) {
                Ok(file) => Some(file),
                Err(e) => {
                    OutputFormatter::warning(&e.to_string());
                    None
                }
            })
            .collect()
    }

    fn process_file(
        &self,
        entry: &FileEntry,
        classifier: &Classifier,
        planner: &PathPlanner,
        progress: Option<&ProgressBar>,
        run: &mut RunState,
    ) {
        let opts = &self.options;
        let say = |print: &dyn Fn()| match progress {
            Some(pb) => pb.suspend(print),
            None => print(),
        };

        let category = classifier.classify(&entry.path);
        let target = if opts.dry_run {
            planner.plan(entry, &category)
        } else {
            match planner.prepare(entry, &category) {
                Ok(target) => target,
                Err(e) => {
                    say(&|| OutputFormatter::error(&e.to_string()));
                    run.failures.push(e);
                    return;
                }
            }
        };

        let dst_existed = target.exists();
        if dst_existed && conflict::is_duplicate(&entry.path, &target) {
            say(&|| OutputFormatter::skip("Duplicate of", &target));
            run.skipped.push((
                entry.path.clone(),
                SkipReason::Duplicate {
                    existing: target.clone(),
                },
            ));
            return;
        }

        let claimed = &run.claimed;
        let resolution = conflict::resolve(&target, opts.conflict, |p| {
            p.exists() || claimed.contains(p)
        });
        let final_target = match resolution {
            Resolution::Use(path) => path,
            Resolution::Skip => {
                say(&|| OutputFormatter::skip("Already exists", &target));
                run.skipped.push((
                    entry.path.clone(),
                    SkipReason::Occupied {
                        existing: target.clone(),
                    },
                ));
                return;
            }
        };

        say(&|| OutputFormatter::plan(opts.mode.as_str(), &entry.path, &final_target));
        run.planned.push(PlannedTransfer {
            src: entry.path.clone(),
            dst: final_target.clone(),
            category: category.clone(),
        });

        if opts.dry_run {
            run.claimed.insert(final_target);
            return;
        }

        match transfer::execute(&entry.path, &final_target, opts.mode) {
            Ok(()) => run.records.push(TransferRecord::transfer(
                opts.mode,
                entry.path.clone(),
                final_target,
                category,
                opts.by_date,
                dst_existed,
            )),
            Err(e) => {
                say(&|| OutputFormatter::error(&e.to_string()));
                run.failures.push(e);
            }
        }
    }
}

/// Mutable bookkeeping of one run.
#[derive(Default)]
struct RunState {
    planned: Vec<PlannedTransfer>,
    records: Vec<TransferRecord>,
    skipped: Vec<(PathBuf, SkipReason)>,
    failures: Vec<FileSorterError>,
    /// Destinations handed out during a dry run, which never exist on disk.
    claimed: HashSet<PathBuf>,
}

/// Convenience wrapper: organizes with the given options and no file filter.
pub fn organize(options: OrganizeOptions) -> Result<OrganizeReport> {
    Organizer::new(options).run()
}

fn count_categories<'a>(categories: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for category in categories {
        *counts.entry(category.to_string()).or_default() += 1;
    }
    counts
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| FileSorterError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Dirs {
        _temp: TempDir,
        source: PathBuf,
        dest: PathBuf,
    }

    fn setup() -> Dirs {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let source = temp.path().join("inbox");
        let dest = temp.path().join("sorted");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&dest).unwrap();
        Dirs {
            _temp: temp,
            source,
            dest,
        }
    }

    fn png_rules(dir: &Path) -> PathBuf {
        let path = dir.join("rules.json");
        fs::write(&path, r#"{".png": "Images"}"#).unwrap();
        path
    }

    #[test]
    fn test_missing_source_is_invalid_argument() {
        let dirs = setup();
        let options = OrganizeOptions::new(dirs.source.join("nope"), &dirs.dest);
        assert!(matches!(
            organize(options),
            Err(FileSorterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_rule_file_aborts_before_mutation() {
        let dirs = setup();
        fs::write(dirs.source.join("a.png"), b"abcde").unwrap();
        let options = OrganizeOptions::new(&dirs.source, &dirs.dest)
            .rules_path(Some(dirs.source.join("missing.json")));

        assert!(matches!(
            organize(options),
            Err(FileSorterError::NotFound { .. })
        ));
        assert!(dirs.source.join("a.png").exists());
        assert_eq!(fs::read_dir(&dirs.dest).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_rule_file_leaves_destination_uncreated() {
        let dirs = setup();
        fs::write(dirs.source.join("a.png"), b"abcde").unwrap();
        let dest = dirs._temp.path().join("not-yet");
        let options = OrganizeOptions::new(&dirs.source, &dest)
            .rules_path(Some(dirs._temp.path().join("missing.json")));

        assert!(organize(options).is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn test_real_run_creates_destination_root() {
        let dirs = setup();
        fs::write(dirs.source.join("a.txt"), "text").unwrap();
        let dest = dirs._temp.path().join("fresh").join("sorted");

        organize(OrganizeOptions::new(&dirs.source, &dest)).expect("organize failed");

        assert!(dest.join("Text").join("a.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_organized() {
        let dirs = setup();
        let elsewhere = dirs._temp.path().join("elsewhere");
        fs::create_dir_all(&elsewhere).unwrap();
        fs::write(elsewhere.join("real.txt"), "real").unwrap();
        std::os::unix::fs::symlink(elsewhere.join("real.txt"), dirs.source.join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(&elsewhere, dirs.source.join("linked-dir")).unwrap();

        let report = organize(OrganizeOptions::new(&dirs.source, &dirs.dest).recursive(true))
            .expect("organize failed");

        assert_eq!(report.total_files, 1);
        assert_eq!(report.transferred(), 1);
        assert_eq!(
            fs::read_to_string(dirs.dest.join("Text").join("link.txt")).unwrap(),
            "real"
        );
    }

    #[test]
    fn test_summary_counts_only_transferred_files() {
        let dirs = setup();
        fs::write(dirs.source.join("a.txt"), "text").unwrap();
        fs::write(dirs.source.join("b.txt"), "more").unwrap();

        let dry = organize(OrganizeOptions::new(&dirs.source, &dirs.dest).dry_run(true)).unwrap();
        assert_eq!(dry.category_counts.get("Text"), Some(&2));

        let report = organize(OrganizeOptions::new(&dirs.source, &dirs.dest)).unwrap();
        assert_eq!(report.category_counts.get("Text"), Some(&2));
        assert_eq!(
            report.category_counts.values().sum::<usize>(),
            report.transferred()
        );
    }

    #[test]
    fn test_move_single_file_records_manifest() {
        let dirs = setup();
        let rules = png_rules(dirs._temp.path());
        fs::write(dirs.source.join("a.png"), b"abcde").unwrap();

        let report = organize(OrganizeOptions::new(&dirs.source, &dirs.dest).rules_path(Some(rules)))
            .expect("organize failed");

        assert_eq!(report.total_files, 1);
        assert_eq!(report.transferred(), 1);
        assert!(report.manifest_written);
        assert!(dirs.dest.join("Images").join("a.png").exists());
        assert!(!dirs.source.join("a.png").exists());

        let records = manifest::read(&report.manifest_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mode, "move");
        assert_eq!(records[0].category, "Images");
        assert!(!records[0].dst_existed);
        assert_eq!(records[0].src, dirs.source.join("a.png"));
        assert_eq!(records[0].dst, dirs.dest.join("Images").join("a.png"));
    }

    #[test]
    fn test_non_recursive_ignores_subdirectories() {
        let dirs = setup();
        fs::create_dir_all(dirs.source.join("nested")).unwrap();
        fs::write(dirs.source.join("top.txt"), "top").unwrap();
        fs::write(dirs.source.join("nested").join("deep.txt"), "deep").unwrap();

        let flat = organize(OrganizeOptions::new(&dirs.source, &dirs.dest).dry_run(true)).unwrap();
        assert_eq!(flat.total_files, 1);

        let deep = organize(
            OrganizeOptions::new(&dirs.source, &dirs.dest)
                .dry_run(true)
                .recursive(true),
        )
        .unwrap();
        assert_eq!(deep.total_files, 2);
    }

    #[test]
    fn test_dry_run_plans_distinct_renames() {
        let dirs = setup();
        fs::create_dir_all(dirs.source.join("one")).unwrap();
        fs::create_dir_all(dirs.source.join("two")).unwrap();
        fs::write(dirs.source.join("one").join("same.txt"), "first").unwrap();
        fs::write(dirs.source.join("two").join("same.txt"), "second").unwrap();

        let report = organize(
            OrganizeOptions::new(&dirs.source, &dirs.dest)
                .recursive(true)
                .dry_run(true),
        )
        .unwrap();

        let targets: HashSet<_> = report.planned.iter().map(|p| p.dst.clone()).collect();
        assert_eq!(targets.len(), 2);
        assert!(report.records.is_empty());
        assert!(!report.manifest_written);
        assert_eq!(fs::read_dir(&dirs.dest).unwrap().count(), 0);
    }

    #[test]
    fn test_skip_strategy_leaves_source() {
        let dirs = setup();
        fs::create_dir_all(dirs.dest.join("Text")).unwrap();
        fs::write(dirs.dest.join("Text").join("note.txt"), "old").unwrap();
        fs::write(dirs.source.join("note.txt"), "new").unwrap();

        let report = organize(
            OrganizeOptions::new(&dirs.source, &dirs.dest).conflict(ConflictStrategy::Skip),
        )
        .unwrap();

        assert_eq!(report.transferred(), 0);
        assert!(matches!(
            report.skipped[0].1,
            SkipReason::Occupied { .. }
        ));
        assert!(dirs.source.join("note.txt").exists());
        assert_eq!(
            fs::read_to_string(dirs.dest.join("Text").join("note.txt")).unwrap(),
            "old"
        );
    }

    #[test]
    fn test_dest_inside_source_is_not_walked() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().to_path_buf();
        let dest = source.join("sorted");
        fs::create_dir_all(dest.join("Text")).unwrap();
        fs::write(dest.join("Text").join("old.txt"), "old").unwrap();
        fs::write(source.join("new.txt"), "new").unwrap();

        let report = organize(OrganizeOptions::new(&source, &dest).recursive(true)).unwrap();

        assert_eq!(report.total_files, 1);
        assert!(dest.join("Text").join("new.txt").exists());
    }

    #[test]
    fn test_filter_excludes_files() {
        let dirs = setup();
        fs::write(dirs.source.join("keep.txt"), "keep").unwrap();
        fs::write(dirs.source.join("drop.tmp"), "drop").unwrap();

        let config: crate::config::Config =
            toml::from_str("[filters.exclude]\nextensions = [\"tmp\"]\n").unwrap();
        let report = Organizer::new(OrganizeOptions::new(&dirs.source, &dirs.dest))
            .with_filter(config.file_filter().unwrap())
            .run()
            .unwrap();

        assert_eq!(report.total_files, 1);
        assert!(dirs.source.join("drop.tmp").exists());
    }

    #[test]
    fn test_manifest_write_failure_is_not_fatal() {
        let dirs = setup();
        fs::write(dirs.source.join("a.txt"), "text").unwrap();
        let bad_manifest = dirs.dest.join("missing-dir").join("manifest.json");

        let report = organize(
            OrganizeOptions::new(&dirs.source, &dirs.dest).manifest_out(Some(bad_manifest.clone())),
        )
        .expect("manifest failure must not abort the run");

        assert_eq!(report.transferred(), 1);
        assert!(!report.manifest_written);
        assert!(matches!(
            report.manifest_error,
            Some(FileSorterError::ManifestWriteFailure { .. })
        ));
        assert_eq!(report.manifest_path, bad_manifest);
        assert!(dirs.dest.join("Text").join("a.txt").exists());
    }
}
