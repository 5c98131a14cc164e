//! Remote document store.
//!
//! The reporter keeps its durable history in a single named entry of a
//! remote document (a GitHub gist). Two implementations exist:
//!
//! - [`GistClient`] - talks to the GitHub gists API over HTTPS
//! - [`MemoryStore`] - in-process document for tests and dry runs
//!
//! Both are driven through the [`RemoteStore`] trait so the sync pipeline
//! never depends on a concrete transport.

pub mod gist;
pub mod memory;

use std::fmt;

use crate::error::Result;

pub use gist::{GistClient, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT};
pub use memory::MemoryStore;

/// Name of the entry inside the remote document that holds the results.
pub const ENTRY_NAME: &str = "results.jsonl";

/// Bearer credential and document ID for one remote document.
///
/// Supplied by the caller; never persisted or rotated here.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub document_id: String,
    pub token: String,
}

impl Credentials {
    pub fn new(document_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("document_id", &self.document_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Trait for remote document stores.
///
/// A single attempt per call; callers decide what a failure means.
pub trait RemoteStore: Send + Sync {
    /// Fetch the current text of the results entry.
    ///
    /// Returns `Ok(None)` when the document has no such entry (first run).
    /// Transport, auth and decode failures are returned as errors.
    fn download(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<Option<String>>> + Send;

    /// Replace the text of the results entry with `content`.
    fn upload(
        &self,
        credentials: &Credentials,
        content: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
