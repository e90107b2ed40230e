//! Destination path planning.
//!
//! A file lands at `dest_root/<category>/<file name>`, or at
//! `dest_root/<category>/<YYYY>/<MM>/<file name>` when date partitioning is on.
//! Year and month come from the file's modification time in local time.

use crate::error::{FileSorterError, Result};
use chrono::{DateTime, Datelike, Local};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A file discovered under the source root during one run.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, if the platform could report it.
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    /// Reads size and modification time for `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| FileSorterError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// Computes destination paths under a destination root.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    dest_root: PathBuf,
    by_date: bool,
}

impl PathPlanner {
    /// Creates a planner rooted at `dest_root`.
    ///
    /// # Arguments
    ///
    /// * `dest_root` - Directory that receives the category folders
    /// * `by_date` - Insert `<YYYY>/<MM>` below the category folder
    pub fn new(dest_root: impl Into<PathBuf>, by_date: bool) -> Self {
        Self {
            dest_root: dest_root.into(),
            by_date,
        }
    }

    /// Computes the destination for `entry` without touching the filesystem.
    ///
    /// # Example
    ///
    /// ```
    /// use filesorter::planner::{FileEntry, PathPlanner};
    /// use std::path::PathBuf;
    ///
    /// let planner = PathPlanner::new("/sorted", false);
    /// let entry = FileEntry {
    ///     path: PathBuf::from("/inbox/a.png"),
    ///     size: 0,
    ///     modified: None,
    /// };
    /// assert_eq!(planner.plan(&entry, "Images"), PathBuf::from("/sorted/Images/a.png"));
    /// ```
    pub fn plan(&self, entry: &FileEntry, category: &str) -> PathBuf {
        let mut dir = self.dest_root.join(category);
        if self.by_date {
            let stamp: DateTime<Local> = entry.modified.unwrap_or_else(SystemTime::now).into();
            dir.push(stamp.year().to_string());
            dir.push(format!("{:02}", stamp.month()));
        }

        match entry.path.file_name() {
            Some(name) => dir.join(name),
            None => dir,
        }
    }

    /// Computes the destination for `entry` and creates its parent directory.
    ///
    /// Creating a directory that already exists is not an error.
    pub fn prepare(&self, entry: &FileEntry, category: &str) -> Result<PathBuf> {
        let target = self.plan(entry, category);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| FileSorterError::io(parent, e))?;
        }
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry_at(path: &str, modified: Option<SystemTime>) -> FileEntry {
        FileEntry {
            path: PathBuf::from(path),
            size: 0,
            modified,
        }
    }

    #[test]
    fn test_plan_without_date() {
        let planner = PathPlanner::new("/dest", false);
        let target = planner.plan(&entry_at("/src/sub/a.png", None), "Images");
        assert_eq!(target, PathBuf::from("/dest/Images/a.png"));
    }

    #[test]
    fn test_plan_with_date_uses_modification_time() {
        let modified: SystemTime = Local
            .with_ymd_and_hms(2023, 3, 15, 12, 0, 0)
            .single()
            .expect("valid local time")
            .into();
        let planner = PathPlanner::new("/dest", true);
        let target = planner.plan(&entry_at("/src/report.pdf", Some(modified)), "PDF");
        assert_eq!(target, PathBuf::from("/dest/PDF/2023/03/report.pdf"));
    }

    #[test]
    fn test_plan_with_date_falls_back_to_now() {
        let now = Local::now();
        let planner = PathPlanner::new("/dest", true);
        let target = planner.plan(&entry_at("/src/x.txt", None), "Text");

        let month_dir = target.parent().expect("month dir");
        let year_dir = month_dir.parent().expect("year dir");
        assert_eq!(year_dir.file_name().unwrap().to_string_lossy(), now.year().to_string());
        assert_eq!(month_dir.file_name().unwrap().to_string_lossy().len(), 2);
    }

    #[test]
    fn test_plan_does_not_create_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let planner = PathPlanner::new(temp_dir.path(), false);
        let target = planner.plan(&entry_at("/src/a.png", None), "Images");

        assert!(!target.parent().unwrap().exists());
    }

    #[test]
    fn test_prepare_creates_directories_idempotently() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let planner = PathPlanner::new(temp_dir.path(), true);
        let entry = entry_at("/src/a.png", Some(SystemTime::now()));

        let first = planner.prepare(&entry, "Images").expect("first prepare");
        let second = planner.prepare(&entry, "Images").expect("second prepare");

        assert_eq!(first, second);
        assert!(first.parent().unwrap().is_dir());
        assert!(first.starts_with(temp_dir.path().join("Images")));
    }

    #[test]
    fn test_file_entry_from_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("five.bin");
        fs::write(&path, b"12345").expect("Failed to write test file");

        let entry = FileEntry::from_path(&path).expect("metadata");
        assert_eq!(entry.size, 5);
        assert!(entry.modified.is_some());
    }
}
