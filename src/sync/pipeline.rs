//! The merge, upload and cleanup cycle.
//!
//! One cycle runs strictly in this order:
//!
//! 1. Scan the results directory (no work: stop, no remote calls)
//! 2. Download the remote entry into the staging file
//! 3. Append a separator if the remote content was non-empty
//! 4. Append every scanned file, sequentially, in scan order
//! 5. Upload the staging file
//! 6. On success, delete every scanned file; on failure, delete none
//! 7. Remove the staging file, whatever happened above
//!
//! A source file is only deleted once its content is part of a confirmed
//! remote write.

use std::path::PathBuf;

use tokio::task::JoinSet;

use super::file::{append_file_content, append_str, file_size, overwrite, read_file_streaming, remove_best_effort};
use super::scan::{scan_result_files, ScanOutcome};
use super::types::{CycleReport, DeleteOutcome, RemoteState};
use crate::error::Result;
use crate::remote::{Credentials, RemoteStore};

/// Default results directory.
pub const DEFAULT_RESULTS_DIR: &str = "./results";

/// Staging file name, placed inside the results directory by default.
pub const STAGING_FILE_NAME: &str = ".gist_backup";

/// Local paths used by one pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPaths {
    pub results_dir: PathBuf,
    pub staging_file: PathBuf,
}

impl SyncPaths {
    /// Paths with the staging file inside `results_dir`.
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        let results_dir = results_dir.into();
        let staging_file = results_dir.join(STAGING_FILE_NAME);
        Self {
            results_dir,
            staging_file,
        }
    }

    #[must_use]
    pub fn with_staging_file(mut self, staging_file: impl Into<PathBuf>) -> Self {
        self.staging_file = staging_file.into();
        self
    }
}

impl Default for SyncPaths {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_DIR)
    }
}

/// Merges local result files into the remote document.
///
/// Assumes it is the only pipeline working against its document and
/// staging path.
pub struct SyncPipeline<S> {
    store: S,
    credentials: Credentials,
    paths: SyncPaths,
}

impl<S: RemoteStore> SyncPipeline<S> {
    pub fn new(store: S, credentials: Credentials, paths: SyncPaths) -> Self {
        Self {
            store,
            credentials,
            paths,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn paths(&self) -> &SyncPaths {
        &self.paths
    }

    /// Run one full cycle.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the staging file or reading a source
    /// file fails. Nothing remote has changed and nothing local has been
    /// deleted in that case. Download and upload failures are not errors;
    /// they are logged and reflected in the report.
    pub async fn process_results(&self) -> Result<CycleReport> {
        tracing::info!("Checking for new results...");

        let files = match scan_result_files(&self.paths.results_dir).await {
            ScanOutcome::Files(files) => files,
            ScanOutcome::Empty => {
                tracing::info!("No new results found");
                return Ok(CycleReport::Idle { listing_error: None });
            }
            ScanOutcome::Failed(detail) => {
                tracing::warn!(%detail, "could not list results directory");
                tracing::info!("No new results found");
                return Ok(CycleReport::Idle {
                    listing_error: Some(detail),
                });
            }
        };

        tracing::info!(count = files.len(), "Found {} result files", files.len());

        let outcome = self.merge_and_upload(files).await;
        remove_best_effort(&self.paths.staging_file).await;
        outcome
    }

    async fn merge_and_upload(&self, files: Vec<PathBuf>) -> Result<CycleReport> {
        let staging = &self.paths.staging_file;

        let remote = self.fetch_remote().await;
        if remote.is_found() {
            tracing::info!("Downloaded existing gist");
        } else {
            tracing::info!("Starting fresh");
        }
        self.stage_remote(&remote).await?;

        for file in &files {
            tracing::debug!(file = %file.display(), "merging");
            append_file_content(file, staging).await?;
        }

        let merged = read_file_streaming(staging).await?;
        let bytes = merged.len();

        if !self.push_remote(&merged).await {
            return Ok(CycleReport::UploadFailed {
                remote: remote.status(),
                files,
            });
        }

        let deletions = delete_sources(&files).await;
        tracing::info!(count = files.len(), bytes, "Uploaded and deleted {} files", files.len());

        Ok(CycleReport::Uploaded {
            remote: remote.status(),
            files,
            bytes,
            deletions,
        })
    }

    /// Download the current remote entry.
    ///
    /// A failed download is reported as `Unreachable`, which callers treat
    /// like `Absent`.
    pub async fn fetch_remote(&self) -> RemoteState {
        match self.store.download(&self.credentials).await {
            Ok(Some(content)) => RemoteState::Found(content),
            Ok(None) => RemoteState::Absent,
            Err(e) => {
                tracing::warn!(error = %e, "could not download remote results, treating as empty");
                RemoteState::Unreachable(e.to_string())
            }
        }
    }

    /// Reset the staging file from the remote state.
    ///
    /// The staging file ends up holding the remote content followed by one
    /// `\n` separator, or nothing at all when there is no remote content.
    ///
    /// # Errors
    ///
    /// Returns an error if the staging file cannot be written.
    pub async fn stage_remote(&self, remote: &RemoteState) -> Result<()> {
        let staging = &self.paths.staging_file;

        match remote {
            RemoteState::Found(content) => {
                overwrite(staging, content).await?;
                if file_size(staging).await > 0 {
                    append_str(staging, "\n").await?;
                }
            }
            RemoteState::Absent | RemoteState::Unreachable(_) => overwrite(staging, "").await?,
        }

        Ok(())
    }

    /// Replace the remote entry with `content`.
    ///
    /// Returns whether the upload succeeded; failures are logged.
    pub async fn push_remote(&self, content: &str) -> bool {
        match self.store.upload(&self.credentials, content).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Upload failed: {e}");
                false
            }
        }
    }
}

/// Delete already-merged source files concurrently.
///
/// Each deletion stands alone: a failure is recorded and logged but never
/// stops the others. Outcomes are returned in input order.
async fn delete_sources(files: &[PathBuf]) -> Vec<DeleteOutcome> {
    let mut tasks = JoinSet::new();
    for (index, path) in files.iter().cloned().enumerate() {
        tasks.spawn(async move {
            let error = tokio::fs::remove_file(&path).await.err().map(|e| e.to_string());
            (index, DeleteOutcome { path, error })
        });
    }

    let mut outcomes = Vec::with_capacity(files.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => {
                if let Some(error) = &outcome.error {
                    tracing::warn!(path = %outcome.path.display(), %error, "failed to delete merged file");
                }
                outcomes.push((index, outcome));
            }
            Err(e) => tracing::warn!(error = %e, "deletion task failed"),
        }
    }

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}
