//! File classification into category labels.
//!
//! A file's lowercase extension is looked up in the active [`RuleSet`] first. When
//! the extension is not mapped, the file's MIME type is guessed and its major type
//! decides the category. Anything else lands in [`OTHER_CATEGORY`].
//!
//! # Examples
//!
//! ```
//! use filesorter::classifier::Classifier;
//! use filesorter::rules::RuleSet;
//! use std::path::Path;
//!
//! let classifier = Classifier::new(RuleSet::from_pairs([(".png", "Images")]));
//! assert_eq!(classifier.classify(Path::new("holiday.PNG")), "Images");
//! ```

use crate::rules::{RuleSet, normalize_extension};
use std::path::Path;

/// Label for files that neither the rules nor the MIME fallback can place.
pub const OTHER_CATEGORY: &str = "Other";

/// MIME major type to category label, used when no rule matches.
const MIME_MAJOR_CATEGORIES: &[(&str, &str)] = &[
    ("image", "Images"),
    ("audio", "Audio"),
    ("video", "Videos"),
    ("text", "Text"),
];

/// Maps files to category labels using a rule set with MIME-type fallback.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: RuleSet,
}

impl Classifier {
    /// Creates a classifier over a fixed rule set.
    ///
    /// # Arguments
    ///
    /// * `rules` - Extension rules consulted before any MIME guessing
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Returns the category label for `path`. Never fails.
    ///
    /// # Arguments
    ///
    /// * `path` - File to classify; its contents are only read when no rule matches
    ///
    /// # Example
    ///
    /// ```
    /// use filesorter::classifier::Classifier;
    /// use std::path::Path;
    ///
    /// let classifier = Classifier::default();
    /// assert_eq!(classifier.classify(Path::new("song.MP3")), "Audio");
    /// assert_eq!(classifier.classify(Path::new("unknown.zzq")), "Other");
    /// ```
    pub fn classify(&self, path: &Path) -> String {
        if let Some(ext) = path.extension()
            && let Some(label) = self.rules.get(&normalize_extension(&ext.to_string_lossy()))
        {
            return label.to_string();
        }

        guess_mime_type(path)
            .and_then(|mime| category_for_mime(&mime))
            .unwrap_or(OTHER_CATEGORY)
            .to_string()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(RuleSet::default())
    }
}

/// Guesses the MIME type of a file.
///
/// The file header is sniffed with `infer` first; if that yields nothing (or the
/// file cannot be read, or is empty) the type is guessed from the file name alone.
pub fn guess_mime_type(path: &Path) -> Option<String> {
    if let Ok(Some(kind)) = infer::get_from_path(path) {
        return Some(kind.mime_type().to_string());
    }

    mime_guess::from_path(path).first_raw().map(str::to_string)
}

/// Maps a MIME type to a category by its major type, e.g. `audio/mpeg` to `Audio`.
pub fn category_for_mime(mime: &str) -> Option<&'static str> {
    let major = mime.split('/').next()?.trim().to_lowercase();
    MIME_MAJOR_CATEGORIES
        .iter()
        .find(|(known, _)| *known == major)
        .map(|(_, label)| *label)
}
