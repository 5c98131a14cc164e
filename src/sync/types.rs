//! Types for the sync pipeline.

use std::path::PathBuf;

use serde::Serialize;

/// What the pipeline learned about the remote entry at the start of a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState {
    /// The entry exists; its text.
    Found(String),
    /// The document has no results entry yet.
    Absent,
    /// The download failed.
    ///
    /// Treated exactly like `Absent`, so the next upload replaces whatever
    /// history the remote holds with this cycle's content only. This is a
    /// known durability gap, kept as the observed contract.
    Unreachable(String),
}

impl RemoteState {
    /// Whether remote content was confirmed to exist.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Summary without the content, for reports.
    #[must_use]
    pub fn status(&self) -> RemoteStatus {
        match self {
            Self::Found(_) => RemoteStatus::Found,
            Self::Absent => RemoteStatus::Absent,
            Self::Unreachable(detail) => RemoteStatus::Unreachable(detail.clone()),
        }
    }
}

/// Content-free form of [`RemoteState`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RemoteStatus {
    Found,
    Absent,
    Unreachable(String),
}

/// Result of deleting one source file after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one pipeline cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleReport {
    /// Nothing to do; no remote calls were made.
    Idle {
        /// Set when the directory listing failed rather than being empty.
        #[serde(skip_serializing_if = "Option::is_none")]
        listing_error: Option<String>,
    },
    /// Merged content was uploaded and the sources deleted.
    Uploaded {
        remote: RemoteStatus,
        files: Vec<PathBuf>,
        bytes: usize,
        deletions: Vec<DeleteOutcome>,
    },
    /// Upload failed; every source file was kept for the next cycle.
    UploadFailed {
        remote: RemoteStatus,
        files: Vec<PathBuf>,
    },
}

impl CycleReport {
    /// Number of source files that were merged (zero unless uploaded).
    #[must_use]
    pub fn uploaded_files(&self) -> usize {
        match self {
            Self::Uploaded { files, .. } => files.len(),
            Self::Idle { .. } | Self::UploadFailed { .. } => 0,
        }
    }

    /// Deletions that failed after a successful upload.
    #[must_use]
    pub fn failed_deletions(&self) -> Vec<&DeleteOutcome> {
        match self {
            Self::Uploaded { deletions, .. } => {
                deletions.iter().filter(|d| !d.is_deleted()).collect()
            }
            Self::Idle { .. } | Self::UploadFailed { .. } => Vec::new(),
        }
    }
}
