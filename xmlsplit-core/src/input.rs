//! Input file resolution
//!
//! Turns a configured input directory plus file pattern into the single
//! document a run will split. This happens once, while the configuration is
//! built; the splitter itself never searches the filesystem.

use crate::error::{Result, SplitError};
use glob::{glob, Pattern};
use std::path::{Path, PathBuf};

/// Pattern used when none is configured
pub const DEFAULT_INPUT_PATTERN: &str = "*";

/// The chosen input document and how many candidates competed for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSelection {
    /// Resolved document path
    pub path: PathBuf,
    /// Number of files that matched the pattern
    pub candidates: usize,
}

impl InputSelection {
    /// Selection of an explicitly named file
    pub fn single(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            candidates: 1,
        }
    }

    /// Whether other files were skipped in favour of this one
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// Resolve the document to split inside `dir`.
///
/// Candidates are regular, non-hidden files matching `pattern`. When several
/// match, the first in sorted path order wins, so the choice does not depend
/// on directory enumeration order.
pub fn resolve_input(dir: &Path, pattern: &str) -> Result<InputSelection> {
    if pattern.trim().is_empty() {
        return Err(SplitError::Configuration(
            "input pattern must not be empty".into(),
        ));
    }
    Pattern::new(pattern).map_err(|e| {
        SplitError::Configuration(format!("invalid input pattern '{pattern}': {e}"))
    })?;

    let missing = || SplitError::MissingInput {
        dir: dir.to_path_buf(),
        pattern: pattern.to_string(),
    };

    if !dir.is_dir() {
        return Err(missing());
    }

    let full_pattern = format!(
        "{}/{}",
        Pattern::escape(&dir.to_string_lossy()),
        pattern
    );
    let paths = glob(&full_pattern).map_err(|e| {
        SplitError::Configuration(format!("invalid input pattern '{pattern}': {e}"))
    })?;

    let mut files = Vec::new();
    for path_result in paths {
        let path = path_result.map_err(|e| SplitError::io(e.path().to_path_buf(), e.into_error()))?;
        if path.is_file() && !is_hidden(&path) {
            files.push(path);
        }
    }

    files.sort();
    files.dedup();

    let candidates = files.len();
    let path = files.into_iter().next().ok_or_else(missing)?;

    Ok(InputSelection { path, candidates })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}
