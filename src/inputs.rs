//! Resolving input files: glob expansion and reading

use std::path::{Path, PathBuf};

use glob::glob;
use tracing::warn;

use crate::error::{Error, Result};

/// Expand glob patterns in input paths
///
/// Patterns keep their command-line order; the matches of each pattern are
/// sorted so `"[0-9]*.pdf"` yields a stable sequence. Plain paths pass through.
pub fn expand_globs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();

        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let entries = glob(pattern).map_err(|e| Error::InvalidGlob(format!("{pattern}: {e}")))?;

            let mut matched = Vec::new();
            for entry in entries {
                match entry {
                    Ok(path) => matched.push(path),
                    Err(e) => warn!(%pattern, error = %e, "Unreadable glob match skipped"),
                }
            }
            if matched.is_empty() {
                return Err(Error::NoFilesMatched(pattern.to_string()));
            }

            matched.sort();
            paths.extend(matched);
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

/// Read a whole file, reporting a missing one as [`Error::FileNotFound`]
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    Ok(std::fs::read(path)?)
}

/// File name of a path, for archive entry names
pub fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
