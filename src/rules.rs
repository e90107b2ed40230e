//! Extension-to-category rule sets.
//!
//! A [`RuleSet`] maps a lowercase file extension (with its leading dot) to a
//! category label. It is built once per run, either from the built-in
//! [`DEFAULT_RULES`] table or from a rule file, and is immutable afterwards.
//!
//! # Rule File Format
//!
//! Rule files are flat key/value documents. Keys may be written with or without the
//! leading dot and in any case; JSON, YAML (`.yaml`/`.yml`) and TOML (`.toml`) are
//! accepted:
//!
//! ```json
//! {
//!     ".jpg": "Pictures",
//!     "PDF": "Papers"
//! }
//! ```

use crate::error::{FileSorterError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Rules used when no rule file is given.
pub const DEFAULT_RULES: &[(&str, &str)] = &[
    // Images
    (".jpg", "Images"),
    (".jpeg", "Images"),
    (".png", "Images"),
    (".gif", "Images"),
    (".webp", "Images"),
    // Documents
    (".pdf", "PDF"),
    (".doc", "Documents"),
    (".docx", "Documents"),
    (".txt", "Text"),
    (".md", "Markdown"),
    (".ppt", "Presentations"),
    (".pptx", "Presentations"),
    (".xls", "Spreadsheets"),
    (".xlsx", "Spreadsheets"),
    (".csv", "Spreadsheets"),
    // Audio / Video
    (".mp3", "Audio"),
    (".wav", "Audio"),
    (".flac", "Audio"),
    (".mp4", "Videos"),
    (".mov", "Videos"),
    (".mkv", "Videos"),
    // Code / Archives
    (".py", "Code"),
    (".js", "Code"),
    (".ts", "Code"),
    (".zip", "Archives"),
    (".rar", "Archives"),
    (".7z", "Archives"),
];

/// An immutable mapping from normalized extension to category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    rules: HashMap<String, String>,
}

impl RuleSet {
    /// Builds a rule set from arbitrary key/label pairs, normalizing every key.
    ///
    /// # Examples
    ///
    /// ```
    /// use filesorter::rules::RuleSet;
    ///
    /// let rules = RuleSet::from_pairs([("PNG", "Images")]);
    /// assert_eq!(rules.get(".png"), Some("Images"));
    /// ```
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let rules = pairs
            .into_iter()
            .map(|(ext, label)| (normalize_extension(ext.as_ref()), label.into()))
            .collect();
        Self { rules }
    }

    /// Loads the rule set for a run.
    ///
    /// With no path the built-in defaults are used; a rule file replaces them entirely.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `path` does not exist and `Malformed` if it cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FileSorterError::NotFound {
                what: "Rule file",
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| FileSorterError::io(path, e))?;
        let malformed = |reason: String| FileSorterError::Malformed {
            what: "rule file",
            path: path.to_path_buf(),
            reason,
        };

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let raw: HashMap<String, String> = match extension.as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).map_err(|e| malformed(e.to_string()))?
            }
            "toml" => toml::from_str(&content).map_err(|e| malformed(e.to_string()))?,
            _ => serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?,
        };

        Ok(Self::from_pairs(raw))
    }

    /// Looks up the label for an already-normalized extension such as `".png"`.
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.rules.get(extension).map(String::as_str)
    }

    /// Number of mapped extensions.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_RULES.iter().copied())
    }
}

/// Lowercases an extension and makes sure it carries a leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}
