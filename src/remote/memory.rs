//! In-memory remote store for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{Credentials, RemoteStore};
use crate::error::{Error, Result};

/// Remote store that keeps each document's entry in a map.
///
/// Failure switches simulate an unreachable service; the call counters
/// let tests assert that idle cycles make no remote calls.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, String>>,
    fail_downloads: AtomicBool,
    fail_uploads: AtomicBool,
    downloads: AtomicUsize,
    uploads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with `content` already present for `document_id`.
    pub fn with_document(document_id: &str, content: &str) -> Self {
        let store = Self::new();
        store.set(document_id, content);
        store
    }

    pub fn set(&self, document_id: &str, content: &str) {
        self.documents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(document_id.to_string(), content.to_string());
    }

    pub fn get(&self, document_id: &str) -> Option<String> {
        self.documents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(document_id)
            .cloned()
    }

    pub fn fail_downloads(&self, fail: bool) {
        self.fail_downloads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Number of download calls made so far.
    pub fn download_calls(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    /// Number of upload calls made so far.
    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

impl RemoteStore for MemoryStore {
    async fn download(&self, credentials: &Credentials) -> Result<Option<String>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        if self.fail_downloads.load(Ordering::SeqCst) {
            return Err(Error::Remote("simulated download failure".to_string()));
        }
        Ok(self.get(&credentials.document_id))
    }

    async fn upload(&self, credentials: &Credentials, content: &str) -> Result<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(Error::Remote("simulated upload failure".to_string()));
        }
        self.set(&credentials.document_id, content);
        Ok(())
    }
}
