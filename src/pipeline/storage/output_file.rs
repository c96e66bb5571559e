use sha2::{Digest, Sha256};
use std::fs::{self, Permissions};
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::constants;
use crate::error::{BuildError, Result};
use crate::pipeline::context::NetworkFile;

/// Serialize loaded networks as `## <Network>` blocks separated by one blank
/// line. Networks without surviving entries still get their header.
pub fn render(networks: &[NetworkFile]) -> String {
    let blocks: Vec<String> = networks
        .iter()
        .filter(|n| n.loaded)
        .map(|n| {
            let mut block = format!("{}{}", constants::NETWORK_HEADER_PREFIX, n.name);
            for entry in &n.entries {
                block.push('\n');
                block.push_str(entry);
            }
            block
        })
        .collect();

    if blocks.is_empty() {
        return String::new();
    }
    let mut output = blocks.join("\n\n");
    output.push('\n');
    output
}

/// Contents of the previous manifest, or `None` if there is none yet.
pub fn read_previous(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(BuildError::io(path, e)),
    }
}

/// Replace `path` with `contents` in one step: write a sibling temp file and
/// rename it over the target. Creates missing parent directories.
///
/// The replacement keeps the permissions of the file it replaces; a new file
/// is made world-readable since the manifest is served publicly.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| BuildError::io(parent, e))?;
    if let Some(permissions) = target_permissions(path) {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| BuildError::io(tmp.path(), e))?;
    }
    tmp.write_all(contents.as_bytes())
        .map_err(|e| BuildError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| BuildError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| BuildError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = contents.len(), "Wrote file");
    Ok(())
}

fn target_permissions(path: &Path) -> Option<Permissions> {
    match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => new_file_permissions(),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(constants::NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

pub fn sha256_hex(contents: &str) -> String {
    hex::encode(Sha256::digest(contents.as_bytes()))
}
