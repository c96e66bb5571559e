use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

use crate::constants;
use crate::domain::NetworkSource;
use crate::error::{BuildError, Result};

/// Reads network seller lists into candidate lines.
pub struct SourceLoader;

impl SourceLoader {
    /// Load the candidate lines for one network.
    ///
    /// Returns `Ok(None)` when the source file does not exist so the caller can
    /// skip the network; any other read failure is fatal.
    pub fn load(source: &NetworkSource) -> Result<Option<Vec<String>>> {
        let content = match fs::read_to_string(&source.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    network = %source.name,
                    path = %source.path.display(),
                    "Source file missing, skipping network"
                );
                return Ok(None);
            }
            Err(e) => return Err(BuildError::io(&source.path, e)),
        };

        let lines = split_lines(&content);
        debug!(network = %source.name, lines = lines.len(), "Loaded source");
        Ok(Some(lines))
    }
}

/// Trimmed, non-empty, non-comment lines in file order.
pub fn split_lines(content: &str) -> Vec<String> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment(line))
        .map(str::to_string)
        .collect()
}

/// Expects a trimmed line.
pub fn is_comment(line: &str) -> bool {
    line.starts_with(constants::COMMENT_PREFIX)
}

/// Every `*.txt` file in `dir` becomes a network named after its trimmed file
/// stem, ordered by file name.
pub fn discover_sources(dir: &Path) -> Result<Vec<NetworkSource>> {
    let entries = fs::read_dir(dir).map_err(|e| BuildError::io(dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| BuildError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|s| s.to_str()) != Some(constants::SOURCE_EXTENSION) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            sources.push(NetworkSource::new(stem.trim(), path.clone()));
        }
    }

    sources.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(sources)
}
