// Series file IO: a JSON array per file, replaced atomically via temp file + rename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::io::AsyncWriteExt;

use crate::error::{MonitorError, Result};
use crate::models::AggregateRecord;

/// Reads a series file. `Ok(None)` when the file does not exist.
pub(super) async fn read_series_file(path: &Path) -> Result<Option<Vec<AggregateRecord>>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("read {}", path.display()))
                .into());
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| MonitorError::StorageCorrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes the whole series to `path`. Readers see either the old or the new file.
pub(super) async fn write_series_file(path: &Path, records: &[AggregateRecord]) -> Result<()> {
    let payload = serde_json::to_vec(records).context("serialize series")?;
    let temp = temp_path(path);

    let mut file = tokio::fs::File::create(&temp)
        .await
        .with_context(|| format!("create {}", temp.display()))?;
    file.write_all(&payload)
        .await
        .with_context(|| format!("write {}", temp.display()))?;
    file.sync_all()
        .await
        .with_context(|| format!("fsync {}", temp.display()))?;
    drop(file);

    tokio::fs::rename(&temp, path)
        .await
        .with_context(|| format!("rename {} -> {}", temp.display(), path.display()))?;
    Ok(())
}
