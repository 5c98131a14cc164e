//! File operations for the sync pipeline.
//!
//! - Streaming reads with a bounded buffer (no single unbounded slurp)
//! - Appending to the staging file
//! - Best-effort removal for temporary files
//! - Atomic writes: write to a hidden temp file, sync to disk, then rename

use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::Result;

/// Chunk size for streaming reads (16 KiB).
pub const STREAM_BUFFER_SIZE: usize = 16 * 1024;

/// Read a file's full text content in `STREAM_BUFFER_SIZE` chunks.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD and logged, so one
/// corrupt result file cannot hold back the rest of the directory.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read. Errors are never
/// swallowed here: a file that vanished mid-cycle must abort the cycle.
pub async fn read_file_streaming(path: &Path) -> Result<String> {
    let mut file = File::open(path).await?;
    let mut chunk = vec![0u8; STREAM_BUFFER_SIZE];
    let mut bytes = Vec::new();

    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);
    }

    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid UTF-8, replacing bad bytes");
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Append `content` to `target`, creating it if missing.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or written.
pub async fn append_str(target: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(target)
        .await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Append the full content of `source` to `target`.
///
/// # Errors
///
/// Propagates read errors from `source` and write errors on `target`.
pub async fn append_file_content(source: &Path, target: &Path) -> Result<()> {
    let content = read_file_streaming(source).await?;
    append_str(target, &content).await
}

/// Replace `path` with `content` (create or truncate).
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn overwrite(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).await?;
    Ok(())
}

/// Get the size of a file in bytes.
///
/// Returns 0 if the file doesn't exist.
pub async fn file_size(path: &Path) -> u64 {
    fs::metadata(path).await.map(|m| m.len()).unwrap_or(0)
}

/// Remove a file, ignoring any failure.
///
/// Returns whether the file was removed.
pub async fn remove_best_effort(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "ignoring removal failure");
            false
        }
    }
}

/// Temp sibling used by `atomic_write`.
///
/// Dot-prefixed so the result scanner never picks up a half-written file.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write content to a file atomically.
///
/// This function:
/// 1. Writes content to a hidden temporary sibling (`.<name>.tmp`)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub async fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = temp_path_for(path);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    {
        let mut file = File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await?;
    }

    fs::rename(&temp_path, path).await?;

    Ok(())
}
