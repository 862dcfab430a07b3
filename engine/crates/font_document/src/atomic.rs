use std::fs::Permissions;
use std::io::Write;
use std::path::Path;

use crate::FontDocumentError;

/// Writes `bytes` to `path` through a sibling temporary file and a rename.
///
/// The temporary file is removed on every failure path, so the destination is
/// either the previous file or the complete new one. `path` may be the file
/// the document was loaded from.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), FontDocumentError> {
    let write_err = |source: std::io::Error| FontDocumentError::Write {
        path: path.display().to_string(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".needlefont_")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;

    tmp.write_all(bytes).map_err(write_err)?;
    // Temporary files start out owner-only.
    if let Some(permissions) = target_permissions(path) {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(write_err)?;
    }
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;

    log::debug!("Renamed temporary file onto {}", path.display());
    Ok(())
}

/// The file being replaced keeps its mode; a new file gets the usual 0644.
fn target_permissions(path: &Path) -> Option<Permissions> {
    match std::fs::metadata(path) {
        Ok(existing) if existing.is_file() => Some(existing.permissions()),
        _ => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}
