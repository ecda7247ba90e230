use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{KeyValueStore, Namespace};

/// Process-local store. Contents are lost on drop.
///
/// Reads and writes can be made to fail on demand, which is how the
/// session's fallback paths are exercised.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<(Namespace, String), Value>>,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    failing: RwLock<HashSet<Namespace>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Puts `value` in place without counting it as a write.
    pub async fn seed(&self, ns: Namespace, key: &str, value: Value) {
        self.entries.write().await.insert((ns, key.to_string()), value);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every read and write of `ns` fail, leaving other namespaces alone.
    pub async fn fail_namespace(&self, ns: Namespace, fail: bool) {
        let mut failing = self.failing.write().await;
        if fail {
            failing.insert(ns);
        } else {
            failing.remove(&ns);
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, ns: Namespace, key: &str) -> anyhow::Result<Option<Value>> {
        if self.fail_reads.load(Ordering::SeqCst) || self.failing.read().await.contains(&ns) {
            anyhow::bail!("memory store: read of {ns}/{key} failed");
        }
        Ok(self.entries.read().await.get(&(ns, key.to_string())).cloned())
    }

    async fn set(&self, ns: Namespace, key: &str, value: Value) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) || self.failing.read().await.contains(&ns) {
            anyhow::bail!("memory store: write of {ns}/{key} failed");
        }
        self.entries.write().await.insert((ns, key.to_string()), value);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn namespaces_are_independent() {
        let store = MemoryStore::new();
        store.set(Namespace::Foods, "k", json!([1])).await.unwrap();
        assert!(store.has(Namespace::Foods, "k").await.unwrap());
        assert!(!store.has(Namespace::Meals, "k").await.unwrap());
        assert_eq!(store.get(Namespace::Targets, "k").await.unwrap(), None);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        assert!(store.set(Namespace::Foods, "k", json!([])).await.is_err());
        assert_eq!(store.write_count(), 0);

        store.fail_reads(true);
        assert!(store.get(Namespace::Foods, "k").await.is_err());
    }

    #[tokio::test]
    async fn one_namespace_can_be_made_to_fail() {
        let store = MemoryStore::new();
        store.fail_namespace(Namespace::Meals, true).await;
        assert!(store.set(Namespace::Meals, "k", json!([])).await.is_err());
        assert!(store.get(Namespace::Meals, "k").await.is_err());
        store.set(Namespace::Foods, "k", json!([])).await.unwrap();

        store.fail_namespace(Namespace::Meals, false).await;
        store.set(Namespace::Meals, "k", json!([])).await.unwrap();
        assert_eq!(store.write_count(), 2);
    }
}
