//! Result directory scanning.

use std::path::{Path, PathBuf};

/// Extension that marks a file as a result file.
pub const RESULT_EXTENSION: &str = ".jsonl";

/// Outcome of listing the result directory.
///
/// `Failed` keeps the listing error visible to callers even though the
/// pipeline treats it the same as `Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Files(Vec<PathBuf>),
    Empty,
    Failed(String),
}

impl ScanOutcome {
    /// Collapse to the list of files to process.
    #[must_use]
    pub fn into_files(self) -> Vec<PathBuf> {
        match self {
            Self::Files(files) => files,
            Self::Empty | Self::Failed(_) => Vec::new(),
        }
    }
}

/// Whether a bare filename names a result file.
#[must_use]
pub fn is_result_file_name(name: &str) -> bool {
    name.ends_with(RESULT_EXTENSION) && !name.starts_with('.')
}

/// List result files in `dir`, in directory listing order.
///
/// Dotfiles (including the staging file) are excluded, as are entries
/// that are not regular files.
pub async fn scan_result_files(dir: &Path) -> ScanOutcome {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => return ScanOutcome::Failed(format!("{}: {e}", dir.display())),
    };

    let mut files = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => return ScanOutcome::Failed(format!("{}: {e}", dir.display())),
        };

        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !is_result_file_name(name) {
            continue;
        }

        let path = dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => tracing::debug!(path = %path.display(), "skipping non-file entry"),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry"),
        }
    }

    if files.is_empty() {
        ScanOutcome::Empty
    } else {
        ScanOutcome::Files(files)
    }
}

/// List result files, treating an unreadable directory as empty.
pub async fn get_new_result_files(dir: &Path) -> Vec<PathBuf> {
    let outcome = scan_result_files(dir).await;
    if let ScanOutcome::Failed(detail) = &outcome {
        tracing::warn!(%detail, "could not list results directory");
    }
    outcome.into_files()
}
