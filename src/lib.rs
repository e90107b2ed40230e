//! filesorter - sort files into category folders, with dry-run and undo.
//!
//! Files are classified by extension rules (falling back to their MIME type),
//! placed under `DEST/<category>[/<year>/<month>]`, checked for duplicates and
//! naming conflicts, and moved or copied. Every executed transfer is recorded in
//! a JSON manifest that [`undo::undo_from_manifest`] can replay in reverse.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod manifest;
pub mod organizer;
pub mod output;
pub mod planner;
pub mod rules;
pub mod transfer;
pub mod undo;

pub use classifier::Classifier;
pub use config::{Config, FileFilter};
pub use conflict::ConflictStrategy;
pub use error::{FileSorterError, Result};
pub use manifest::TransferRecord;
pub use organizer::{OrganizeOptions, OrganizeReport, Organizer, organize};
pub use rules::RuleSet;
pub use transfer::TransferMode;
pub use undo::{UndoReport, undo_from_manifest};

pub use cli::{Args, run_cli};
