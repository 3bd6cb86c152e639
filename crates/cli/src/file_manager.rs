//! File system operations for report artifacts

use crate::error::{Error, Result};
use std::path::Path;

/// Create directory if it doesn't exist
pub fn ensure_dir_exists(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::FileWrite {
        path: dir.display().to_string(),
        source: e,
    })
}

/// Write `content` to `path`, creating parent directories
pub fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir_exists(parent)?;
    }
    std::fs::write(path, content).map_err(|e| Error::FileWrite {
        path: path.display().to_string(),
        source: e,
    })
}
