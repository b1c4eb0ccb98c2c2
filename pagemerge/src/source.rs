//! Source documents and the store that deduplicates them.
//!
//! A source document is the raw bytes of one imported PDF. Sources are
//! identified by the SHA-256 digest of their content, so re-importing the
//! same file is free and two different files that happen to share a name
//! never collide.
//!
//! The store never parses anything; malformed bytes are only discovered by
//! whoever opens them (import inspection, the renderer, or export).

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Content-based identity of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Compute the identity of a byte buffer.
    pub fn for_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First twelve hex digits, enough to tell sources apart in logs.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

/// Read-only handle to a source's bytes.
///
/// Every consumer that parses a source (renderer, export) takes its own
/// handle. The buffer behind it is immutable, so concurrent parses can never
/// observe a mutated or moved buffer.
#[derive(Debug, Clone)]
pub struct SourceBytes(Arc<[u8]>);

impl SourceBytes {
    /// Number of bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SourceBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SourceBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

/// An imported source document.
#[derive(Debug)]
pub struct SourceDocument {
    id: SourceId,
    name: String,
    bytes: SourceBytes,
}

impl SourceDocument {
    /// Create a source document from its name and full contents.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let id = SourceId::for_bytes(&bytes);
        Self {
            id,
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Content identity.
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Original file name, used for display and error reporting.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A fresh handle to the bytes for one parse.
    pub fn bytes(&self) -> SourceBytes {
        self.bytes.clone()
    }

    /// Size of the document in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Registry of imported source documents keyed by content.
#[derive(Debug, Default)]
pub struct SourceStore {
    sources: HashMap<SourceId, Arc<SourceDocument>>,
}

impl SourceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document, or return the already registered one with the
    /// same content.
    ///
    /// When the content is already known, the new bytes are dropped and the
    /// name of the first registration is kept.
    pub fn register(&mut self, name: impl Into<String>, bytes: Vec<u8>) -> Arc<SourceDocument> {
        let id = SourceId::for_bytes(&bytes);
        if let Some(existing) = self.sources.get(&id) {
            tracing::debug!(source = %id, name = existing.name(), "source already registered");
            return Arc::clone(existing);
        }

        let document = Arc::new(SourceDocument {
            id: id.clone(),
            name: name.into(),
            bytes: bytes.into(),
        });
        tracing::debug!(
            source = %id,
            name = document.name(),
            size = document.size(),
            "registered source"
        );
        self.sources.insert(id, Arc::clone(&document));
        document
    }

    /// Look up a source by identity.
    pub fn get(&self, id: &SourceId) -> Option<Arc<SourceDocument>> {
        self.sources.get(id).cloned()
    }

    /// Whether a source with this identity is registered.
    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Drop every source that nothing but the store refers to.
    ///
    /// Returns the number of sources released.
    pub fn release_unreferenced(&mut self) -> usize {
        let before = self.sources.len();
        self.sources.retain(|_, source| Arc::strong_count(source) > 1);
        let released = before - self.sources.len();
        if released > 0 {
            tracing::debug!(released, "released unreferenced sources");
        }
        released
    }

    /// Drop all sources held by the store.
    pub fn clear(&mut self) {
        self.sources.clear();
    }
}
