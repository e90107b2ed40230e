//! Transfer manifests.
//!
//! A manifest is a pretty-printed JSON array of [`TransferRecord`]s, one per
//! executed transfer, in execution order. It is written once at the end of an
//! organize run and only ever read afterwards (by undo).
//!
//! ```json
//! [
//!   {
//!     "action": "transfer",
//!     "mode": "move",
//!     "src": "/home/me/Downloads/a.png",
//!     "dst": "/home/me/Sorted/Images/a.png",
//!     "category": "Images",
//!     "by_date": false,
//!     "dst_existed": false
//!   }
//! ]
//! ```

use crate::error::{FileSorterError, Result};
use crate::transfer::TransferMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The only action kind currently recorded.
pub const TRANSFER_ACTION: &str = "transfer";

/// One executed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub action: String,
    /// `"move"` or `"copy"`; kept verbatim so unknown values survive reading.
    pub mode: String,
    pub src: PathBuf,
    pub dst: PathBuf,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub by_date: bool,
    /// Whether the planned destination (before conflict renaming) was occupied.
    #[serde(default)]
    pub dst_existed: bool,
}

impl TransferRecord {
    pub fn transfer(
        mode: TransferMode,
        src: PathBuf,
        dst: PathBuf,
        category: impl Into<String>,
        by_date: bool,
        dst_existed: bool,
    ) -> Self {
        Self {
            action: TRANSFER_ACTION.to_string(),
            mode: mode.as_str().to_string(),
            src,
            dst,
            category: category.into(),
            by_date,
            dst_existed,
        }
    }

    pub fn is_transfer(&self) -> bool {
        self.action == TRANSFER_ACTION
    }

    /// The parsed mode, or `None` for values this version does not know.
    pub fn transfer_mode(&self) -> Option<TransferMode> {
        self.mode.parse().ok()
    }
}

/// Writes `records` to `path` as pretty-printed UTF-8 JSON.
///
/// # Errors
///
/// Returns `ManifestWriteFailure`; transfers already performed are unaffected.
pub fn write(path: &Path, records: &[TransferRecord]) -> Result<()> {
    let failure = |reason: String| FileSorterError::ManifestWriteFailure {
        path: path.to_path_buf(),
        reason,
    };

    let mut json = serde_json::to_string_pretty(records).map_err(|e| failure(e.to_string()))?;
    json.push('\n');
    fs::write(path, json).map_err(|e| failure(e.to_string()))
}

/// Reads a manifest back into its ordered records.
///
/// # Errors
///
/// Returns `NotFound` if `path` does not exist and `Malformed` if it cannot be parsed.
pub fn read(path: &Path) -> Result<Vec<TransferRecord>> {
    if !path.exists() {
        return Err(FileSorterError::NotFound {
            what: "Manifest",
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| FileSorterError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| FileSorterError::Malformed {
        what: "manifest",
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// File name for a manifest created now, e.g. `manifest_2025-10-08T12-00-00.json`.
pub fn default_manifest_name() -> String {
    format!(
        "manifest_{}.json",
        chrono::Local::now().format("%Y-%m-%dT%H-%M-%S")
    )
}

/// Default manifest location inside the destination root.
pub fn default_manifest_path(dest_root: &Path) -> PathBuf {
    dest_root.join(default_manifest_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_record(name: &str) -> TransferRecord {
        TransferRecord::transfer(
            TransferMode::Move,
            PathBuf::from(format!("/src/{name}")),
            PathBuf::from(format!("/dest/Bilder/{name}")),
            "Bilder",
            false,
            false,
        )
    }

    #[test]
    fn test_write_then_read_keeps_order_and_unicode() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("manifest.json");
        let records = vec![sample_record("Grüße.png"), sample_record("日本.png")];

        write(&path, &records).expect("Failed to write manifest");

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Grüße.png"), "non-ASCII must not be escaped");
        assert!(raw.contains("\n  {"), "manifest should be pretty-printed");
        assert!(raw.contains("\"dst_existed\": false"));

        assert_eq!(read(&path).expect("Failed to read manifest"), records);
    }

    #[test]
    fn test_read_missing_manifest() {
        let result = read(Path::new("/non/existent/manifest.json"));
        assert!(matches!(result, Err(FileSorterError::NotFound { .. })));
    }

    #[test]
    fn test_read_malformed_manifest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("manifest.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read(&path), Err(FileSorterError::Malformed { .. })));
    }

    #[test]
    fn test_unknown_mode_survives_reading() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("manifest.json");
        fs::write(
            &path,
            r#"[{"action": "transfer", "mode": "link", "src": "/a", "dst": "/b"}]"#,
        )
        .unwrap();

        let records = read(&path).expect("Failed to read manifest");
        assert_eq!(records[0].mode, "link");
        assert_eq!(records[0].transfer_mode(), None);
        assert!(!records[0].dst_existed);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("nope").join("manifest.json");

        let result = write(&path, &[sample_record("a.png")]);
        assert!(matches!(result, Err(FileSorterError::ManifestWriteFailure { .. })));
    }

    #[test]
    fn test_default_manifest_name_format() {
        let name = default_manifest_name();
        assert!(name.starts_with("manifest_"));
        assert!(name.ends_with(".json"));
        assert!(!name.contains(':'));
        // manifest_YYYY-MM-DDTHH-MM-SS.json
        assert_eq!(name.len(), "manifest_".len() + 19 + ".json".len());
        assert_eq!(&name[19..20], "T");
    }
}
