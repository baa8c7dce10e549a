//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use glob::{glob, Pattern};

use crate::builder::errors::BuildError;

/// Modification time of `path`.
pub fn mtime(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Remove a file, ignoring a missing one (`rm -f`).
///
/// Returns whether a file was actually removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, BuildError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

/// Files directly inside `dir` whose names end with `suffix`, sorted.
pub fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, BuildError> {
    let pattern = format!(
        "{}/*{}",
        Pattern::escape(&dir.to_string_lossy()),
        Pattern::escape(suffix)
    );

    let entries = glob(&pattern).map_err(|e| {
        BuildError::io(dir, io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))
    })?;

    let mut results = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    results.push(path);
                }
            }
            Err(e) => {
                tracing::warn!("glob error: {}", e);
            }
        }
    }

    results.sort();
    Ok(results)
}

/// Remove every file directly inside `dir` ending with `suffix`.
pub fn remove_files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, BuildError> {
    let files = files_with_suffix(dir, suffix)?;
    for file in &files {
        tracing::info!("rm -f {}", file.display());
        remove_file_if_exists(file)?;
    }
    Ok(files)
}
