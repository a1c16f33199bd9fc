// Version directory and PDF discovery
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::types::{ExportError, Result};

/// Direct children of `root` that are directories and whose name starts with
/// `prefix`, sorted by name. A missing root yields an empty list.
pub fn find_version_directories(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("root {} does not exist", root.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(ExportError::ReadDir {
                path: root.to_path_buf(),
                source,
            })
        }
    };

    let mut version_dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ExportError::ReadDir {
            path: root.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        // Byte comparison so names that are not valid UTF-8 still match
        let matches_prefix = name.as_encoded_bytes().starts_with(prefix.as_bytes());
        // Path::is_dir follows symlinks
        if matches_prefix && entry.path().is_dir() {
            version_dirs.push(entry.path());
        }
    }

    version_dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(version_dirs)
}

/// True when the extension matches one of `extensions` (ASCII, any case)
fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want.as_ref())))
        .unwrap_or(false)
}

/// Regular files below `root` whose extension is in `extensions`,
/// depth-first with entries sorted by name. Empty when `root` is absent.
pub fn find_files_with_extensions<S: AsRef<str>>(root: &Path, extensions: &[S]) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(entry) if entry.file_type().is_file() && has_extension(entry.path(), extensions) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!("skipping unreadable entry under {}: {}", root.display(), e),
        }
    }
    files
}

/// All `.pdf` files below `source_root`
pub fn find_pdf_files(source_root: &Path) -> Vec<PathBuf> {
    find_files_with_extensions(source_root, &["pdf"])
}
