//! Optional file filtering configuration.
//!
//! Filters decide which files under the source root take part in a run. By
//! default every file does. Settings live in a TOML file:
//!
//! ```toml
//! [filters]
//! skip_hidden = true
//!
//! [filters.exclude]
//! names = ["Thumbs.db", ".DS_Store"]
//! extensions = ["part", "tmp"]
//! globs = ["node_modules/**", "*.crdownload"]
//! regex = ["^~\\$"]
//!
//! [filters.include]
//! globs = ["keep/**"]
//! ```
//!
//! Include globs win over every exclude rule.

use crate::error::{FileSorterError, Result};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-directory config file.
pub const LOCAL_CONFIG_FILE: &str = ".filesorterrc.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filters: FilterSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Leave files whose name starts with `.` alone.
    #[serde(default)]
    pub skip_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeSettings,

    #[serde(default)]
    pub include: IncludeSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeSettings {
    /// Exact file names.
    #[serde(default)]
    pub names: Vec<String>,
    /// Extensions without the dot, matched case-insensitively.
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Globs matched against the path relative to the source root and the file name.
    #[serde(default)]
    pub globs: Vec<String>,
    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeSettings {
    #[serde(default)]
    pub globs: Vec<String>,
}

impl Config {
    /// Loads the configuration for a run.
    ///
    /// Lookup order: `explicit`, then `./.filesorterrc.toml`, then
    /// `$HOME/.config/filesorter/config.toml`, then built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if an explicit path does not exist and `Config` if a
    /// file cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Self::load_from_file(&local);
        }

        if let Some(home) = std::env::var_os("HOME") {
            let user = PathBuf::from(home)
                .join(".config")
                .join("filesorter")
                .join("config.toml");
            if user.is_file() {
                return Self::load_from_file(&user);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FileSorterError::NotFound {
                what: "Config file",
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| FileSorterError::io(path, e))?;
        toml::from_str(&content)
            .map_err(|e| FileSorterError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Compiles the filter settings into a [`FileFilter`].
    pub fn file_filter(&self) -> Result<FileFilter> {
        FileFilter::new(&self.filters)
    }
}

/// Compiled filter rules.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    skip_hidden: bool,
    names: HashSet<String>,
    extensions: HashSet<String>,
    exclude_globs: Vec<Pattern>,
    exclude_regex: Vec<Regex>,
    include_globs: Vec<Pattern>,
}

impl FileFilter {
    /// A filter that lets every file through.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn new(settings: &FilterSettings) -> Result<Self> {
        let exclude_regex = settings
            .exclude
            .regex
            .iter()
            .map(|re| {
                Regex::new(re)
                    .map_err(|e| FileSorterError::Config(format!("invalid regex '{re}': {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            skip_hidden: settings.skip_hidden,
            names: settings.exclude.names.iter().cloned().collect(),
            extensions: settings
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_globs: compile_globs(&settings.exclude.globs)?,
            exclude_regex,
            include_globs: compile_globs(&settings.include.globs)?,
        })
    }

    /// Decides whether the file at `relative` (relative to the source root) is organized.
    pub fn allows(&self, relative: &Path) -> bool {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if matches_any(&self.include_globs, relative, &name) {
            return true;
        }
        if self.skip_hidden && name.starts_with('.') {
            return false;
        }
        if self.names.contains(&name) {
            return false;
        }
        if let Some(ext) = relative.extension()
            && self.extensions.contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }
        if matches_any(&self.exclude_globs, relative, &name) {
            return false;
        }

        !self.exclude_regex.iter().any(|re| re.is_match(&name))
    }
}

fn compile_globs(globs: &[String]) -> Result<Vec<Pattern>> {
    globs
        .iter()
        .map(|glob| {
            Pattern::new(glob)
                .map_err(|e| FileSorterError::Config(format!("invalid glob '{glob}': {e}")))
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], relative: &Path, name: &str) -> bool {
    patterns
        .iter()
        .any(|p| p.matches_path(relative) || p.matches(name))
}
