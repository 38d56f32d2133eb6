pub mod memory;
pub mod rocks;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::memory::MemoryIndex;
use crate::rocks::RocksIndex;

/// An opaque identifier handed out by a storage backend, referencing stored bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Handle(String);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Handle {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for Handle {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no mapping exists for name: {0}")]
    NotFound(String),

    #[error("backing store unavailable: {0}")]
    StorageUnavailable(String),
}

/// Trait for registering and resolving filename-to-handle mappings.
///
/// At most one mapping exists per name; a later `put` for the same name
/// replaces the earlier one. Atomicity at single-key granularity is the
/// backend's responsibility.
#[async_trait]
pub trait ReferenceIndex: Send + Sync {
    /// Inserts or overwrites the mapping for `name`.
    async fn put(&self, name: &str, handle: Handle) -> IndexResult<()>;

    /// Returns the handle registered for `name`.
    async fn get(&self, name: &str) -> IndexResult<Handle>;
}

#[derive(Clone)]
pub enum Indexes {
    Memory(MemoryIndex),
    Rocks(RocksIndex),
}

impl Indexes {
    /// Returns a reference to the inner value as a trait object.
    pub fn as_trait(&self) -> &dyn ReferenceIndex {
        match self {
            Indexes::Memory(a) => a,
            Indexes::Rocks(b) => b,
        }
    }
}
