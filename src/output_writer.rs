// Output path mapping and artifact writing
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::SEPARATOR_WIDTH;
use crate::types::{ExportError, Result};

/// Place `file` under `target_root` at the same relative position it has
/// below `source_root`.
pub fn mirror_path(file: &Path, source_root: &Path, target_root: &Path) -> Result<PathBuf> {
    let relative = file
        .strip_prefix(source_root)
        .ok()
        .filter(|relative| relative.file_name().is_some())
        .ok_or_else(|| ExportError::OutsideSource {
            path: file.to_path_buf(),
            source_root: source_root.to_path_buf(),
        })?;
    Ok(target_root.join(relative))
}

/// Map a PDF under `source_root` to its `.txt` twin under
/// `<version_dir>/<output_subdir>`, keeping the relative directories.
pub fn output_path_for(
    pdf_path: &Path,
    version_dir: &Path,
    source_root: &Path,
    output_subdir: &Path,
) -> Result<PathBuf> {
    let mut output = mirror_path(pdf_path, source_root, &version_dir.join(output_subdir))?;
    output.set_extension("txt");
    Ok(output)
}

/// Header block followed by the extracted body
pub fn render_artifact(source_name: &str, timestamp: &str, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 128);
    out.push_str("PDF file: ");
    out.push_str(source_name);
    out.push('\n');
    out.push_str("Extraction time: ");
    out.push_str(timestamp);
    out.push('\n');
    out.push_str(&"=".repeat(SEPARATOR_WIDTH));
    out.push_str("\n\n");
    out.push_str(body);
    out
}

/// Write `contents` to `path`, creating parent directories as needed.
/// An existing read-only file is made writable first.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ExportError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    clear_readonly(path)?;

    fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[allow(clippy::permissions_set_readonly_false)]
fn clear_readonly(path: &Path) -> Result<()> {
    let Ok(metadata) = fs::metadata(path) else {
        return Ok(());
    };
    let mut permissions = metadata.permissions();
    if !metadata.is_file() || !permissions.readonly() {
        return Ok(());
    }

    debug!("clearing read-only flag on {}", path.display());
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
