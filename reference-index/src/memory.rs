use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{Handle, IndexError, IndexResult, ReferenceIndex};

/// Index backed by an in-process concurrent map.
///
/// Entry operations are atomic per key, so no additional locking is needed
/// around put/get.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    entries: Arc<DashMap<String, Handle>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReferenceIndex for MemoryIndex {
    async fn put(&self, name: &str, handle: Handle) -> IndexResult<()> {
        self.entries.insert(name.to_string(), handle);
        Ok(())
    }

    async fn get(&self, name: &str) -> IndexResult<Handle> {
        self.entries
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| IndexError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let index = MemoryIndex::new();

        index.put("a.txt", Handle::from("h1")).await.unwrap();

        let resolved = index.get("a.txt").await.unwrap();
        assert_eq!(resolved, Handle::from("h1"));
    }

    #[tokio::test]
    async fn test_get_unregistered_name() {
        let index = MemoryIndex::new();

        let err = index.get("missing.txt").await.unwrap_err();
        assert!(matches!(err, IndexError::NotFound(name) if name == "missing.txt"));
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_name() {
        let index = MemoryIndex::new();

        index.put("a.txt", Handle::from("h1")).await.unwrap();
        assert_eq!(index.get("a.txt").await.unwrap(), Handle::from("h1"));

        index.put("a.txt", Handle::from("h2")).await.unwrap();
        assert_eq!(index.get("a.txt").await.unwrap(), Handle::from("h2"));
    }

    #[tokio::test]
    async fn test_names_are_independent_keys() {
        let index = MemoryIndex::new();

        index.put("a.txt", Handle::from("h1")).await.unwrap();
        index.put("b.txt", Handle::from("h2")).await.unwrap();

        assert_eq!(index.get("a.txt").await.unwrap(), Handle::from("h1"));
        assert_eq!(index.get("b.txt").await.unwrap(), Handle::from("h2"));
    }
}
