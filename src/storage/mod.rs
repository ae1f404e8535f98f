//! Object-store backends.
//!
//! The coordinator talks to storage only through [`BlobStore`], so the
//! pipeline can run against Azure Blob Storage in production and against
//! [`MemoryBlobStore`] in tests and dry runs.
//!
//! - [`azure`] — Azure Blob Storage through the Azure SDK

pub mod azure;

use crate::error::StoreError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub use azure::AzureBlobStore;

/// A named-object store bound to one container.
///
/// Implementations are shared across invocations behind an `Arc` and must be
/// safe to call concurrently.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Container every object is written to.
    fn container(&self) -> &str;

    /// Write `data` under `name` with the given `Content-Type` and return
    /// the object's public locator.
    async fn put(&self, name: &str, data: Vec<u8>, content_type: &str)
        -> Result<String, StoreError>;
}

/// An object held by [`MemoryBlobStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-process [`BlobStore`]; nothing leaves memory.
#[derive(Debug)]
pub struct MemoryBlobStore {
    base_url: String,
    container: String,
    blobs: Mutex<BTreeMap<String, StoredBlob>>,
}

impl MemoryBlobStore {
    pub const DEFAULT_BASE_URL: &'static str = "memory://pdf2blob";

    pub fn new(container: impl Into<String>) -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL, container)
    }

    pub fn with_base_url(base_url: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            container: container.into(),
            blobs: Mutex::new(BTreeMap::new()),
        }
    }

    /// Locator a blob named `name` gets in this store.
    pub fn locator(&self, name: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.container, name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, name: &str) -> Option<StoredBlob> {
        self.lock().get(name).cloned()
    }

    /// Names of all stored objects, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredBlob>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    fn container(&self) -> &str {
        &self.container
    }

    async fn put(
        &self,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StoreError> {
        self.lock().insert(
            name.to_string(),
            StoredBlob {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.locator(name))
    }
}
