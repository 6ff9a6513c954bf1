//! Atomic output writes

use crate::TaskError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `contents` to `path` so that readers see either nothing or the
/// complete file
///
/// The data goes to a temporary file in the destination's directory, which
/// is then renamed over the destination.
pub async fn write_atomic(path: &Path, contents: String) -> Result<(), TaskError> {
    let target = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || write_sync(&target, contents.as_bytes()))
        .await
        .map_err(|e| e.to_string())
        .and_then(|r| r.map_err(|e| e.to_string()));

    result.map_err(|message| TaskError::Persist {
        path: path.to_path_buf(),
        message,
    })
}

fn write_sync(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
